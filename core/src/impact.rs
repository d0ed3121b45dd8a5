#![deny(missing_docs)]

//! # Change Impact
//!
//! Connects schema-level changes to the endpoints they reach.
//!
//! Added and modified schemas are looked up in the working revision; removed
//! schemas can only be traced in the baseline revision.

use crate::diff::{ChangeKind, ChangeRecord};
use crate::oas::models::DocumentModel;
use crate::usage::{find_usage_details, EndpointUsage};
use indexmap::IndexMap;
use serde::Serialize;

const SCHEMAS_PREFIX: [&str; 2] = ["components", "schemas"];

/// The endpoints affected by changes to one named schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaImpact {
    /// Schema name.
    pub schema: String,
    /// `Added`/`Removed` when the schema itself appeared or vanished, `Modified` otherwise.
    pub change: ChangeKind,
    /// Endpoints reaching the schema, sorted by path then method.
    pub endpoints: Vec<EndpointUsage>,
}

/// Computes one [`SchemaImpact`] per schema touched by `changes`, in first-change order.
pub fn analyze_impact(
    baseline: &DocumentModel,
    working: &DocumentModel,
    changes: &[ChangeRecord],
) -> Vec<SchemaImpact> {
    let mut touched: IndexMap<&str, ChangeKind> = IndexMap::new();
    for record in changes {
        if !record.is_under(&SCHEMAS_PREFIX) {
            continue;
        }
        let Some(name) = record.location.get(SCHEMAS_PREFIX.len()) else {
            continue;
        };
        let change = if record.location.len() == SCHEMAS_PREFIX.len() + 1 {
            record.kind
        } else {
            ChangeKind::Modified
        };
        touched.entry(name.as_str()).or_insert(change);
    }

    touched
        .into_iter()
        .map(|(name, change)| {
            let doc = match change {
                ChangeKind::Removed => baseline,
                ChangeKind::Added | ChangeKind::Modified => working,
            };
            SchemaImpact {
                schema: name.to_string(),
                change,
                endpoints: find_usage_details(doc, name),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::oas::document::parse_document;
    use crate::oas::models::{Endpoint, Method};

    const BASELINE: &str = r#"
paths:
  /pets:
    get:
      responses:
        "200":
          content:
            application/json: { schema: { $ref: '#/components/schemas/Pet' } }
  /legacy:
    get:
      responses:
        "200":
          content:
            application/json: { schema: { $ref: '#/components/schemas/Old' } }
components:
  schemas:
    Pet: { type: object, properties: { id: { type: integer } } }
    Old: { type: string }
"#;

    const WORKING: &str = r#"
paths:
  /pets:
    get:
      responses:
        "200":
          content:
            application/json: { schema: { $ref: '#/components/schemas/Pet' } }
    post:
      requestBody:
        content:
          application/json: { schema: { $ref: '#/components/schemas/NewPet' } }
      responses: {}
components:
  schemas:
    Pet: { type: object, properties: { id: { type: string } } }
    NewPet: { type: object, properties: { pet: { $ref: '#/components/schemas/Pet' } } }
"#;

    #[test]
    fn test_impact_per_schema() {
        let baseline = parse_document(BASELINE).unwrap();
        let working = parse_document(WORKING).unwrap();
        let changes = diff(&baseline, &working);
        let impact = analyze_impact(&baseline, &working, &changes);

        let summary: Vec<(&str, ChangeKind, Vec<Endpoint>)> = impact
            .iter()
            .map(|i| {
                (
                    i.schema.as_str(),
                    i.change,
                    i.endpoints.iter().map(|u| u.endpoint.clone()).collect(),
                )
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                (
                    "Pet",
                    ChangeKind::Modified,
                    vec![
                        Endpoint::new("/pets", Method::Get),
                        Endpoint::new("/pets", Method::Post)
                    ]
                ),
                (
                    "NewPet",
                    ChangeKind::Added,
                    vec![Endpoint::new("/pets", Method::Post)]
                ),
                (
                    "Old",
                    ChangeKind::Removed,
                    vec![Endpoint::new("/legacy", Method::Get)]
                ),
            ]
        );
    }

    #[test]
    fn test_no_schema_changes_no_impact() {
        let baseline = parse_document(BASELINE).unwrap();
        let changes = diff(&baseline, &baseline);
        assert!(analyze_impact(&baseline, &baseline, &changes).is_empty());
    }
}
