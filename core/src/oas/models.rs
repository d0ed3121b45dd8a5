#![deny(missing_docs)]

//! # OpenAPI Models
//!
//! Typed in-memory representation of a parsed document.
//!
//! These structs carry no logic beyond lookups; the resolver, usage finder and
//! diff engine all borrow them.

use crate::oas::schemas::SchemaNode;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// HTTP methods an OpenAPI path item can define.
///
/// Declaration order is the canonical reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// PATCH
    Patch,
    /// TRACE
    Trace,
}

impl Method {
    /// Every method, in canonical order.
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Options,
        Method::Head,
        Method::Patch,
        Method::Trace,
    ];

    /// Lower-case token as used for path item keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
            Method::Patch => "patch",
            Method::Trace => "trace",
        }
    }
}

impl FromStr for Method {
    type Err = ();

    /// Case-insensitive; anything that is not an HTTP method is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Root of a parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentModel {
    /// `$self` of the document, if declared.
    pub self_uri: Option<String>,
    /// Path items keyed by verbatim path template, in document order.
    pub paths: IndexMap<String, PathItem>,
    /// Named schemas from `components.schemas`.
    pub schemas: IndexMap<String, SchemaNode>,
}

/// The operations defined on one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathItem {
    /// Operations keyed by method.
    #[serde(flatten)]
    pub operations: IndexMap<Method, Operation>,
}

impl PathItem {
    /// Operations sorted into canonical method order.
    pub fn iter_canonical(&self) -> impl Iterator<Item = (Method, &Operation)> {
        Method::ALL
            .into_iter()
            .filter_map(move |m| self.operations.get(&m).map(|op| (m, op)))
    }
}

/// One HTTP method's definition within a path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// `operationId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// `summary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Parameters, path-level ones merged in, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Payload>,
    /// Responses keyed by status code.
    pub responses: IndexMap<String, Payload>,
}

impl Operation {
    /// Finds a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A single operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Location (`path`, `query`, `header`, `cookie`).
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is mandatory.
    pub required: bool,
    /// Parameter schema, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
}

/// A request body or a response: schemas keyed by media type.
///
/// An empty `content` is a payload without a body (e.g. `204`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Payload {
    /// Schemas keyed by media type, in declaration order.
    pub content: IndexMap<String, SchemaNode>,
}

/// Identifies one operation: `(path, method)`.
///
/// Ordered by path, then by canonical method order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Endpoint {
    /// Path template.
    pub path: String,
    /// HTTP method.
    pub method: Method,
}

impl Endpoint {
    /// Creates a new endpoint identifier.
    pub fn new(path: impl Into<String>, method: Method) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
