#![deny(missing_docs)]

//! # OpenAPI Module
//!
//! - **models**: Document model (paths, operations, parameters, payloads).
//! - **schemas**: The `SchemaNode` variant and schema classification.
//! - **document**: Text -> `DocumentModel`.
//! - **ref_utils**: `$ref` normalization helpers.
//! - **resolver**: Named schema resolution with cycle detection.

pub mod document;
pub mod models;
pub(crate) mod ref_utils;
pub mod resolver;
pub mod schemas;

pub use document::parse_document;
pub use models::{DocumentModel, Endpoint, Method, Operation, Parameter, PathItem, Payload};
pub use resolver::{lookup, resolve, RefPath};
pub use schemas::{parse_schema, CompositeKind, RefToken, SchemaNode};
