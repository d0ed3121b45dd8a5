#![deny(missing_docs)]

//! # Schema Usage
//!
//! Finds the endpoints that depend on a named schema, directly or through any
//! chain of references, object properties, array items and composite branches.
//!
//! The search never fails: cycles and unresolved references simply end the
//! branch being walked.

use crate::oas::models::{DocumentModel, Endpoint, Operation};
use crate::oas::resolver::lookup;
use crate::oas::schemas::{RefToken, SchemaNode};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Where inside an operation a schema is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "in", rename_all = "camelCase")]
pub enum UsageLocation {
    /// An operation parameter.
    Parameter {
        /// Parameter name.
        name: String,
        /// Parameter location (`query`, `path`, ...).
        location: String,
    },
    /// The request body, for one media type.
    RequestBody {
        /// Media type, e.g. `application/json`.
        media_type: String,
    },
    /// A response, for one status code and media type.
    Response {
        /// Status code, e.g. `200`.
        status: String,
        /// Media type, e.g. `application/json`.
        media_type: String,
    },
}

/// An endpoint that uses the target schema, and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointUsage {
    /// The endpoint.
    #[serde(flatten)]
    pub endpoint: Endpoint,
    /// `operationId` of the operation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// `summary` of the operation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Every place in the operation that reaches the schema.
    pub locations: Vec<UsageLocation>,
}

/// Returns the endpoints that reach `schema_name`, sorted by path then method.
pub fn find_usages(doc: &DocumentModel, schema_name: &str) -> BTreeSet<Endpoint> {
    find_usage_details(doc, schema_name)
        .into_iter()
        .map(|usage| usage.endpoint)
        .collect()
}

/// Returns every endpoint that reaches `schema_name`, with the locations that reach it.
///
/// Sorted by path, then canonical method order.
pub fn find_usage_details(doc: &DocumentModel, schema_name: &str) -> Vec<EndpointUsage> {
    let mut usages = Vec::new();
    for (path, item) in &doc.paths {
        for (method, op) in item.iter_canonical() {
            let locations = operation_usages(doc, op, schema_name);
            if locations.is_empty() {
                continue;
            }
            usages.push(EndpointUsage {
                endpoint: Endpoint::new(path.clone(), method),
                operation_id: op.operation_id.clone(),
                summary: op.summary.clone(),
                locations,
            });
        }
    }
    usages.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
    usages
}

/// Whether `node` reaches `schema_name` within `doc`.
pub fn schema_reaches(doc: &DocumentModel, node: &SchemaNode, schema_name: &str) -> bool {
    UsageWalk::new(doc, schema_name).reaches(node)
}

fn operation_usages(doc: &DocumentModel, op: &Operation, schema_name: &str) -> Vec<UsageLocation> {
    let mut locations = Vec::new();

    for param in &op.parameters {
        if let Some(schema) = &param.schema {
            if schema_reaches(doc, schema, schema_name) {
                locations.push(UsageLocation::Parameter {
                    name: param.name.clone(),
                    location: param.location.clone(),
                });
            }
        }
    }

    if let Some(body) = &op.request_body {
        for (media_type, schema) in &body.content {
            if schema_reaches(doc, schema, schema_name) {
                locations.push(UsageLocation::RequestBody {
                    media_type: media_type.clone(),
                });
            }
        }
    }

    for (status, response) in &op.responses {
        for (media_type, schema) in &response.content {
            if schema_reaches(doc, schema, schema_name) {
                locations.push(UsageLocation::Response {
                    status: status.clone(),
                    media_type: media_type.clone(),
                });
            }
        }
    }

    locations
}

/// One depth-first walk from a single root schema.
///
/// Each named schema is expanded at most once, so the walk is bounded by the
/// number of distinct schemas reachable from the root.
struct UsageWalk<'a> {
    doc: &'a DocumentModel,
    target: &'a str,
    expanded: HashSet<RefToken>,
}

impl<'a> UsageWalk<'a> {
    fn new(doc: &'a DocumentModel, target: &'a str) -> Self {
        Self {
            doc,
            target,
            expanded: HashSet::new(),
        }
    }

    fn reaches(&mut self, node: &'a SchemaNode) -> bool {
        match node {
            SchemaNode::Reference(token) => {
                if token.schema_name().as_deref() == Some(self.target) {
                    return true;
                }
                if !self.expanded.insert(token.clone()) {
                    return false;
                }
                match lookup(self.doc, token) {
                    Ok(next) => self.reaches(next),
                    Err(err) => {
                        tracing::debug!(error = %err, "usage walk stopped at reference");
                        false
                    }
                }
            }
            SchemaNode::Object { properties, .. } => {
                properties.values().any(|prop| self.reaches(prop))
            }
            SchemaNode::Array { items } => self.reaches(items),
            SchemaNode::Composite { branches, .. } => {
                branches.iter().any(|branch| self.reaches(branch))
            }
            SchemaNode::Primitive { .. } | SchemaNode::Unknown(_) => false,
        }
    }
}
