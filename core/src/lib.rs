#![deny(missing_docs)]

//! # oasdelta Core
//!
//! Structural change and schema usage analysis for OpenAPI documents.

/// Shared error types.
pub mod error;

/// OpenAPI document model, parsing and reference resolution.
pub mod oas;

/// Diff calculation.
pub mod diff;

/// Schema usage search.
pub mod usage;

/// Schema change impact.
pub mod impact;

/// Text-level entry points.
pub mod analysis;

pub use analysis::{
    analyze_change, analyze_change_report, compare_documents, find_schema_usages,
    schema_usage_report, usage_report, ChangeReport, ChangeSummary, UsageReport,
};
pub use diff::{compare_schemas, diff, ChangeDetail, ChangeKind, ChangeRecord};
pub use error::{AppError, AppResult};
pub use impact::{analyze_impact, SchemaImpact};
pub use oas::{
    parse_document, resolve, DocumentModel, Endpoint, Method, Operation, Parameter, PathItem,
    Payload, RefPath, RefToken, SchemaNode,
};
pub use usage::{find_usage_details, find_usages, EndpointUsage, UsageLocation};
