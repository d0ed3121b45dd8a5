#![deny(missing_docs)]

//! # Analysis Entry Points
//!
//! The two operations the service layer exposes, over raw document text:
//! - `analyze_change`: baseline text + working text -> ordered change records.
//! - `find_schema_usages`: document text + schema name -> endpoints.
//!
//! Parse errors on any input are returned before any analysis runs, so a caller
//! either gets a complete report or a single error.

use crate::diff::{diff, ChangeKind, ChangeRecord};
use crate::error::AppResult;
use crate::impact::{analyze_impact, SchemaImpact};
use crate::oas::document::parse_document;
use crate::oas::models::{DocumentModel, Endpoint};
use crate::usage::{find_usage_details, find_usages, EndpointUsage};
use serde::Serialize;
use std::collections::BTreeSet;

/// Diffs two document texts.
pub fn analyze_change(baseline_text: &str, working_text: &str) -> AppResult<Vec<ChangeRecord>> {
    let baseline = parse_document(baseline_text)?;
    let working = parse_document(working_text)?;
    Ok(diff(&baseline, &working))
}

/// Finds the endpoints of a document text that reach `schema_name`.
pub fn find_schema_usages(document_text: &str, schema_name: &str) -> AppResult<BTreeSet<Endpoint>> {
    let doc = parse_document(document_text)?;
    Ok(find_usages(&doc, schema_name))
}

/// Counts of change records by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    /// `Added` records.
    pub added: usize,
    /// `Removed` records.
    pub removed: usize,
    /// `Modified` records.
    pub modified: usize,
}

impl ChangeSummary {
    /// Tallies `changes`.
    pub fn from_changes(changes: &[ChangeRecord]) -> Self {
        changes.iter().fold(Self::default(), |mut acc, record| {
            match record.kind {
                ChangeKind::Added => acc.added += 1,
                ChangeKind::Removed => acc.removed += 1,
                ChangeKind::Modified => acc.modified += 1,
            }
            acc
        })
    }

    /// Total number of records.
    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

/// A full change report: records, counts and schema impact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeReport {
    /// Counts by kind.
    pub summary: ChangeSummary,
    /// Ordered change records.
    pub changes: Vec<ChangeRecord>,
    /// Endpoints affected by each changed schema.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub impact: Vec<SchemaImpact>,
}

/// Builds a [`ChangeReport`] from two parsed documents.
pub fn compare_documents(baseline: &DocumentModel, working: &DocumentModel) -> ChangeReport {
    let changes = diff(baseline, working);
    let impact = analyze_impact(baseline, working, &changes);
    let summary = ChangeSummary::from_changes(&changes);
    tracing::debug!(
        added = summary.added,
        removed = summary.removed,
        modified = summary.modified,
        impacted_schemas = impact.len(),
        "diff complete"
    );
    ChangeReport {
        summary,
        changes,
        impact,
    }
}

/// Diffs two document texts into a full [`ChangeReport`].
pub fn analyze_change_report(baseline_text: &str, working_text: &str) -> AppResult<ChangeReport> {
    let baseline = parse_document(baseline_text)?;
    let working = parse_document(working_text)?;
    Ok(compare_documents(&baseline, &working))
}

/// Usage of one schema across a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    /// The schema searched for.
    pub schema_name: String,
    /// Whether the document defines the schema at all.
    pub defined: bool,
    /// Number of affected endpoints.
    pub total_affected_endpoints: usize,
    /// Affected endpoints with usage locations.
    pub affected_endpoints: Vec<EndpointUsage>,
}

/// Builds a [`UsageReport`] for `schema_name` in a parsed document.
pub fn usage_report(doc: &DocumentModel, schema_name: &str) -> UsageReport {
    let affected_endpoints = find_usage_details(doc, schema_name);
    UsageReport {
        schema_name: schema_name.to_string(),
        defined: doc.schemas.contains_key(schema_name),
        total_affected_endpoints: affected_endpoints.len(),
        affected_endpoints,
    }
}

/// Builds a [`UsageReport`] from document text.
pub fn schema_usage_report(document_text: &str, schema_name: &str) -> AppResult<UsageReport> {
    let doc = parse_document(document_text)?;
    Ok(usage_report(&doc, schema_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::oas::models::Method;

    const DOC: &str = r#"
openapi: 3.0.3
paths:
  /pets:
    get:
      responses:
        "200":
          content:
            application/json:
              schema: { type: array, items: { $ref: '#/components/schemas/Pet' } }
components:
  schemas:
    Pet: { type: object }
"#;

    #[test]
    fn test_analyze_change_reflexive() {
        assert!(analyze_change(DOC, DOC).unwrap().is_empty());
    }

    #[test]
    fn test_parse_failure_on_either_side_is_fatal() {
        assert!(matches!(
            analyze_change("paths: [", DOC),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(
            analyze_change(DOC, "openapi: 3.0.0"),
            Err(AppError::Schema(_))
        ));
    }

    #[test]
    fn test_find_schema_usages() {
        let usages = find_schema_usages(DOC, "Pet").unwrap();
        assert_eq!(
            usages.into_iter().collect::<Vec<_>>(),
            vec![Endpoint::new("/pets", Method::Get)]
        );
    }

    #[test]
    fn test_change_report_summary() {
        let working = DOC.replace(
            "Pet: { type: object }",
            "Pet: { type: string }\n    Tag: { type: string }",
        );
        let report = analyze_change_report(DOC, &working).unwrap();
        assert_eq!(
            report.summary,
            ChangeSummary {
                added: 1,
                removed: 0,
                modified: 1
            }
        );
        assert_eq!(report.summary.total(), report.changes.len());
        assert_eq!(report.impact.len(), 2);
        assert_eq!(report.impact[0].schema, "Pet");
        assert_eq!(report.impact[0].endpoints.len(), 1);
    }

    #[test]
    fn test_usage_report_for_undefined_schema() {
        let report = schema_usage_report(DOC, "Ghost").unwrap();
        assert!(!report.defined);
        assert_eq!(report.total_affected_endpoints, 0);
    }
}
