#![deny(missing_docs)]

//! # OpenAPI Document Parsing
//!
//! Builds a [`DocumentModel`] from raw YAML or JSON text.
//!
//! Only the shape needed by the analyses is checked: the root must be a mapping
//! with a `paths` mapping. Everything below that degrades gracefully, so that an
//! unfamiliar construct never aborts a whole analysis.

use crate::error::{AppError, AppResult};
use crate::oas::models::{DocumentModel, Method, Operation, Parameter, PathItem, Payload};
use crate::oas::ref_utils::{extract_component_name, normalize_ref_to_local};
use crate::oas::schemas::{parse_schema, SchemaNode};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Parses an OpenAPI document (YAML or JSON syntax) into a [`DocumentModel`].
///
/// # Errors
///
/// * [`AppError::Parse`] when the text is not well-formed structured data.
/// * [`AppError::Schema`] when the root is not a mapping or `paths` is missing.
pub fn parse_document(text: &str) -> AppResult<DocumentModel> {
    let raw: Value = serde_yaml::from_str(text)?;
    let root = raw
        .as_object()
        .ok_or_else(|| AppError::Schema("document root is not a mapping".into()))?;

    let paths = match root.get("paths") {
        Some(Value::Object(paths)) => paths,
        Some(_) => {
            return Err(AppError::Schema("'paths' is not a mapping".into()));
        }
        None => {
            return Err(AppError::Schema(
                "document is missing the required 'paths' object".into(),
            ));
        }
    };

    let ctx = ParseContext {
        self_uri: root.get("$self").and_then(Value::as_str),
        components: root.get("components").and_then(Value::as_object),
    };

    let schemas = ctx
        .section("schemas")
        .map(|schemas| {
            schemas
                .iter()
                .map(|(name, schema)| (name.clone(), parse_schema(schema, ctx.self_uri)))
                .collect()
        })
        .unwrap_or_default();

    let mut doc = DocumentModel {
        self_uri: ctx.self_uri.map(String::from),
        paths: IndexMap::new(),
        schemas,
    };

    for (path, item) in paths {
        if path.starts_with("x-") {
            continue;
        }
        let Some(item) = item.as_object() else {
            tracing::warn!(path = %path, "skipping path item that is not a mapping");
            continue;
        };
        doc.paths.insert(path.clone(), ctx.path_item(path, item));
    }

    Ok(doc)
}

/// Document-wide state needed while walking path items.
struct ParseContext<'a> {
    self_uri: Option<&'a str>,
    components: Option<&'a Map<String, Value>>,
}

impl<'a> ParseContext<'a> {
    fn section(&self, section: &str) -> Option<&'a Map<String, Value>> {
        self.components?.get(section)?.as_object()
    }

    /// Follows one level of `$ref` into `components/{section}`.
    ///
    /// Inline values are returned unchanged; unresolvable references yield `None`.
    fn component(&self, value: &'a Value, section: &str) -> Option<&'a Value> {
        let Some(raw) = value.get("$ref").and_then(Value::as_str) else {
            return Some(value);
        };
        let resolved = normalize_ref_to_local(raw, self.self_uri)
            .and_then(|local| extract_component_name(&local, section))
            .and_then(|name| self.section(section)?.get(&name));
        if resolved.is_none() {
            tracing::warn!(reference = raw, section, "dropping unresolved component reference");
        }
        resolved
    }

    fn path_item(&self, path: &str, item: &'a Map<String, Value>) -> PathItem {
        let shared = item
            .get("parameters")
            .map(|params| self.parameters(params))
            .unwrap_or_default();

        let mut out = PathItem::default();
        for (key, value) in item {
            let Ok(method) = key.parse::<Method>() else {
                continue;
            };
            let Some(op) = value.as_object() else {
                tracing::warn!(path, method = %method, "skipping operation that is not a mapping");
                continue;
            };
            out.operations.insert(method, self.operation(op, &shared));
        }
        out
    }

    fn operation(&self, op: &'a Map<String, Value>, shared: &[Parameter]) -> Operation {
        let mut parameters = shared.to_vec();
        for param in op
            .get("parameters")
            .map(|params| self.parameters(params))
            .unwrap_or_default()
        {
            match parameters
                .iter_mut()
                .find(|p| p.name == param.name && p.location == param.location)
            {
                Some(existing) => *existing = param,
                None => parameters.push(param),
            }
        }

        let request_body = op
            .get("requestBody")
            .and_then(|body| self.component(body, "requestBodies"))
            .map(|body| self.payload(body));

        let responses = op
            .get("responses")
            .and_then(Value::as_object)
            .map(|responses| {
                responses
                    .iter()
                    .filter(|(code, _)| !code.starts_with("x-"))
                    .filter_map(|(code, response)| {
                        let response = self.component(response, "responses")?;
                        Some((code.clone(), self.payload(response)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Operation {
            operation_id: op
                .get("operationId")
                .and_then(Value::as_str)
                .map(String::from),
            summary: op.get("summary").and_then(Value::as_str).map(String::from),
            parameters,
            request_body,
            responses,
        }
    }

    fn parameters(&self, params: &'a Value) -> Vec<Parameter> {
        params
            .as_array()
            .map(|params| {
                params
                    .iter()
                    .filter_map(|param| self.component(param, "parameters"))
                    .filter_map(|param| self.parameter(param))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parameter(&self, param: &'a Value) -> Option<Parameter> {
        let name = param.get("name").and_then(Value::as_str)?;
        let location = param.get("in").and_then(Value::as_str).unwrap_or_default();
        let required = param
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(location == "path");

        let schema = param
            .get("schema")
            .or_else(|| {
                param
                    .get("content")
                    .and_then(Value::as_object)
                    .and_then(|content| content.values().next())
                    .and_then(|media| media.get("schema"))
            })
            .map(|schema| parse_schema(schema, self.self_uri));

        Some(Parameter {
            name: name.to_string(),
            location: location.to_string(),
            required,
            schema,
        })
    }

    fn payload(&self, body: &'a Value) -> Payload {
        let content = body
            .get("content")
            .and_then(Value::as_object)
            .map(|content| {
                content
                    .iter()
                    .map(|(media, media_obj)| {
                        let schema = media_obj
                            .get("schema")
                            .map(|schema| parse_schema(schema, self.self_uri))
                            .unwrap_or(SchemaNode::Unknown(Value::Null));
                        (media.clone(), schema)
                    })
                    .collect()
            })
            .unwrap_or_default();
        Payload { content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::schemas::RefToken;

    const PETSTORE: &str = r#"
openapi: 3.0.3
info: { title: Pets, version: "1" }
paths:
  x-owner: platform
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        schema: { type: string }
    GET:
      operationId: getPet
      summary: Fetch one pet
      parameters:
        - $ref: '#/components/parameters/Verbose'
      responses:
        "200":
          $ref: '#/components/responses/PetResponse'
        "404":
          description: missing
    delete:
      parameters:
        - name: petId
          in: path
          required: true
          schema: { type: integer }
      responses:
        "204": { description: gone }
    summary: not an operation
components:
  parameters:
    Verbose:
      name: verbose
      in: query
      schema: { type: boolean }
  responses:
    PetResponse:
      description: ok
      content:
        application/json:
          schema:
            $ref: '#/components/schemas/Pet'
  schemas:
    Pet:
      type: object
      properties:
        name: { type: string }
"#;

    #[test]
    fn test_parse_document_structure() {
        let doc = parse_document(PETSTORE).unwrap();
        assert_eq!(doc.paths.len(), 1);
        let item = &doc.paths["/pets/{petId}"];
        assert_eq!(item.operations.len(), 2);

        let get = &item.operations[&Method::Get];
        assert_eq!(get.operation_id.as_deref(), Some("getPet"));
        assert_eq!(get.summary.as_deref(), Some("Fetch one pet"));
        let names: Vec<&str> = get.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["petId", "verbose"]);
        assert!(get.parameter("petId").unwrap().required);
        assert!(!get.parameter("verbose").unwrap().required);

        assert_eq!(
            get.responses["200"].content["application/json"],
            SchemaNode::Reference(RefToken::for_schema("Pet"))
        );
        assert!(get.responses["404"].content.is_empty());
        assert!(doc.schemas.contains_key("Pet"));
    }

    #[test]
    fn test_operation_parameters_override_path_level() {
        let doc = parse_document(PETSTORE).unwrap();
        let delete = &doc.paths["/pets/{petId}"].operations[&Method::Delete];
        assert_eq!(delete.parameters.len(), 1);
        assert_eq!(
            delete.parameters[0].schema,
            Some(SchemaNode::Primitive {
                ty: "integer".into(),
                format: None
            })
        );
    }

    #[test]
    fn test_json_input_is_accepted() {
        let text = r#"{"openapi": "3.1.0", "paths": {"/a": {"get": {"responses": {}}}}}"#;
        let doc = parse_document(text).unwrap();
        assert!(doc.paths["/a"].operations.contains_key(&Method::Get));
    }

    #[test]
    fn test_malformed_text_is_parse_error() {
        let err = parse_document("paths: {/a: [").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_missing_paths_is_schema_error() {
        let err = parse_document("openapi: 3.0.0\ncomponents: {}").unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));

        let err = parse_document("- just\n- a list").unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));

        assert!(parse_document("").is_err());
    }

    #[test]
    fn test_unresolved_component_reference_is_dropped() {
        let yaml = r#"
paths:
  /a:
    get:
      parameters:
        - $ref: '#/components/parameters/Missing'
      responses:
        "200":
          $ref: '#/components/responses/Missing'
"#;
        let doc = parse_document(yaml).unwrap();
        let get = &doc.paths["/a"].operations[&Method::Get];
        assert!(get.parameters.is_empty());
        assert!(get.responses.is_empty());
    }
}
