#![deny(missing_docs)]

//! # Schema Nodes
//!
//! The closed variant every structural comparison and traversal dispatches on.
//!
//! Raw schema objects are classified once, at parse time:
//! - `$ref` -> [`SchemaNode::Reference`]
//! - `oneOf` / `anyOf` / `allOf` -> [`SchemaNode::Composite`]
//! - `type: object` (or bare `properties`) -> [`SchemaNode::Object`]
//! - `type: array` (or bare `items`) -> [`SchemaNode::Array`]
//! - any other string `type` -> [`SchemaNode::Primitive`]
//! - everything else -> [`SchemaNode::Unknown`], carrying the raw value.

use crate::oas::ref_utils::{extract_component_name, normalize_ref_to_local, SCHEMA_POINTER_PREFIX};
use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;

/// A normalized `$ref` string.
///
/// References into the current document are stored as local pointers
/// (`#/components/schemas/Pet`) so identical targets compare equal even when one
/// revision spells them through `$self`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefToken(String);

impl RefToken {
    /// Builds a token from a raw `$ref`, normalizing it against `$self` when possible.
    pub fn from_raw(raw: &str, self_uri: Option<&str>) -> Self {
        Self(normalize_ref_to_local(raw, self_uri).unwrap_or_else(|| raw.to_string()))
    }

    /// Builds the canonical token for a named schema.
    pub fn for_schema(name: &str) -> Self {
        let escaped = name.replace('~', "~0").replace('/', "~1");
        Self(format!("{}{}", SCHEMA_POINTER_PREFIX, escaped))
    }

    /// The schema name, when the token points at `#/components/schemas/{name}`.
    pub fn schema_name(&self) -> Option<String> {
        extract_component_name(&self.0, "schemas")
    }

    /// Returns the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Combinator of a composite schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    /// `oneOf`
    OneOf,
    /// `anyOf`
    AnyOf,
    /// `allOf`
    AllOf,
}

impl CompositeKind {
    /// Combinators in classification priority order.
    pub const ALL: [CompositeKind; 3] = [Self::OneOf, Self::AnyOf, Self::AllOf];

    /// The document keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::OneOf => "oneOf",
            Self::AnyOf => "anyOf",
            Self::AllOf => "allOf",
        }
    }
}

/// A schema, inline or by reference.
///
/// The `Reference` variant is the named (non-owning) arm: it is resolved through
/// the document's schema map. All other variants own their children.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A scalar type such as `string` or `integer`.
    Primitive {
        /// Value of `type`.
        ty: String,
        /// Value of `format`, if any.
        format: Option<String>,
    },
    /// An object with named properties.
    Object {
        /// Properties in declaration order.
        properties: IndexMap<String, SchemaNode>,
        /// Names listed in `required`.
        required: IndexSet<String>,
    },
    /// An array of `items`.
    Array {
        /// Item schema.
        items: Box<SchemaNode>,
    },
    /// A `$ref` to a named schema.
    Reference(RefToken),
    /// A union or intersection of branches.
    Composite {
        /// Which combinator.
        kind: CompositeKind,
        /// Branches in declaration order.
        branches: Vec<SchemaNode>,
    },
    /// Any shape we do not model; kept raw so it can still be compared.
    Unknown(Value),
}

impl SchemaNode {
    /// Short name of the variant, used in logs and change snapshots.
    pub fn variant_name(&self) -> &'static str {
        match self {
            SchemaNode::Primitive { .. } => "primitive",
            SchemaNode::Object { .. } => "object",
            SchemaNode::Array { .. } => "array",
            SchemaNode::Reference(_) => "reference",
            SchemaNode::Composite { .. } => "composite",
            SchemaNode::Unknown(_) => "unknown",
        }
    }

    /// Renders the node back into an OpenAPI-shaped JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            SchemaNode::Primitive { ty, format } => {
                let mut obj = Map::new();
                obj.insert("type".into(), Value::String(ty.clone()));
                if let Some(fmt) = format {
                    obj.insert("format".into(), Value::String(fmt.clone()));
                }
                Value::Object(obj)
            }
            SchemaNode::Object {
                properties,
                required,
            } => {
                let mut obj = Map::new();
                obj.insert("type".into(), json!("object"));
                if !properties.is_empty() {
                    let props: Map<String, Value> = properties
                        .iter()
                        .map(|(name, node)| (name.clone(), node.to_value()))
                        .collect();
                    obj.insert("properties".into(), Value::Object(props));
                }
                if !required.is_empty() {
                    obj.insert("required".into(), json!(required));
                }
                Value::Object(obj)
            }
            SchemaNode::Array { items } => json!({ "type": "array", "items": items.to_value() }),
            SchemaNode::Reference(token) => json!({ "$ref": token.as_str() }),
            SchemaNode::Composite { kind, branches } => {
                let branches: Vec<Value> = branches.iter().map(SchemaNode::to_value).collect();
                let mut obj = Map::new();
                obj.insert(kind.keyword().into(), Value::Array(branches));
                Value::Object(obj)
            }
            SchemaNode::Unknown(raw) => raw.clone(),
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

/// Classifies a raw schema object into a [`SchemaNode`].
///
/// Never fails: unsupported shapes become [`SchemaNode::Unknown`].
pub fn parse_schema(value: &Value, self_uri: Option<&str>) -> SchemaNode {
    let Some(obj) = value.as_object() else {
        return SchemaNode::Unknown(value.clone());
    };

    if let Some(raw) = obj.get("$ref").and_then(Value::as_str) {
        return SchemaNode::Reference(RefToken::from_raw(raw, self_uri));
    }

    for kind in CompositeKind::ALL {
        if let Some(branches) = obj.get(kind.keyword()).and_then(Value::as_array) {
            let branches = branches.iter().map(|b| parse_schema(b, self_uri)).collect();
            return with_sibling_object(obj, self_uri, kind, branches);
        }
    }

    match obj.get("type").and_then(Value::as_str) {
        Some("object") => parse_object(obj, self_uri),
        Some("array") => parse_array(obj, self_uri),
        Some(ty) => SchemaNode::Primitive {
            ty: ty.to_string(),
            format: obj.get("format").and_then(Value::as_str).map(String::from),
        },
        None if obj.get("type").is_some() => SchemaNode::Unknown(value.clone()),
        None if obj.contains_key("properties") => parse_object(obj, self_uri),
        None if obj.contains_key("items") => parse_array(obj, self_uri),
        None => SchemaNode::Unknown(value.clone()),
    }
}

/// `properties`/`required` next to a combinator constrain the same instance, so
/// they become one more `allOf` branch.
fn with_sibling_object(
    obj: &Map<String, Value>,
    self_uri: Option<&str>,
    kind: CompositeKind,
    mut branches: Vec<SchemaNode>,
) -> SchemaNode {
    if !obj.contains_key("properties") && !obj.contains_key("required") {
        return SchemaNode::Composite { kind, branches };
    }
    let sibling = parse_object(obj, self_uri);
    let branches = match kind {
        CompositeKind::AllOf => {
            branches.push(sibling);
            branches
        }
        CompositeKind::OneOf | CompositeKind::AnyOf => {
            vec![SchemaNode::Composite { kind, branches }, sibling]
        }
    };
    SchemaNode::Composite {
        kind: CompositeKind::AllOf,
        branches,
    }
}

fn parse_object(obj: &Map<String, Value>, self_uri: Option<&str>) -> SchemaNode {
    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| (name.clone(), parse_schema(schema, self_uri)))
                .collect()
        })
        .unwrap_or_default();

    let required = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    SchemaNode::Object {
        properties,
        required,
    }
}

fn parse_array(obj: &Map<String, Value>, self_uri: Option<&str>) -> SchemaNode {
    let items = obj
        .get("items")
        .map(|items| parse_schema(items, self_uri))
        .unwrap_or(SchemaNode::Unknown(Value::Null));
    SchemaNode::Array {
        items: Box::new(items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> SchemaNode {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        parse_schema(&value, None)
    }

    #[test]
    fn test_parse_primitive_with_format() {
        let node = parse("type: integer\nformat: int64");
        assert_eq!(
            node,
            SchemaNode::Primitive {
                ty: "integer".into(),
                format: Some("int64".into())
            }
        );
    }

    #[test]
    fn test_parse_object_and_required() {
        let node = parse(
            r#"
type: object
required: [id]
properties:
  id: { type: integer }
  tag: { $ref: '#/components/schemas/Tag' }
"#,
        );
        let SchemaNode::Object {
            properties,
            required,
        } = node
        else {
            panic!("expected object");
        };
        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["id", "tag"]);
        assert!(required.contains("id"));
        assert_eq!(
            properties["tag"],
            SchemaNode::Reference(RefToken::for_schema("Tag"))
        );
    }

    #[test]
    fn test_parse_untyped_properties_is_object() {
        let node = parse("properties:\n  a: { type: string }");
        assert_eq!(node.variant_name(), "object");
    }

    #[test]
    fn test_parse_array_without_items() {
        let node = parse("type: array");
        assert_eq!(
            node,
            SchemaNode::Array {
                items: Box::new(SchemaNode::Unknown(Value::Null))
            }
        );
    }

    #[test]
    fn test_parse_composite_takes_priority_over_type() {
        let node = parse(
            r#"
type: object
allOf:
  - $ref: '#/components/schemas/Base'
  - type: object
    properties:
      extra: { type: string }
"#,
        );
        match node {
            SchemaNode::Composite { kind, branches } => {
                assert_eq!(kind, CompositeKind::AllOf);
                assert_eq!(branches.len(), 2);
            }
            other => panic!("expected composite, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_composite_keeps_sibling_properties() {
        let node = parse(
            r#"
allOf:
  - $ref: '#/components/schemas/Base'
required: [name]
properties:
  name: { type: string }
"#,
        );
        let SchemaNode::Composite { kind, branches } = node else {
            panic!("expected composite");
        };
        assert_eq!(kind, CompositeKind::AllOf);
        assert_eq!(branches.len(), 2);
        assert_eq!(
            branches[1].to_value(),
            json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            })
        );

        let node = parse(
            r#"
oneOf:
  - { type: string }
  - { type: integer }
properties:
  tag: { type: string }
"#,
        );
        let SchemaNode::Composite { kind, branches } = node else {
            panic!("expected composite");
        };
        assert_eq!(kind, CompositeKind::AllOf);
        assert!(matches!(
            &branches[0],
            SchemaNode::Composite { kind: CompositeKind::OneOf, branches } if branches.len() == 2
        ));
        assert_eq!(branches[1].variant_name(), "object");
    }

    #[test]
    fn test_parse_unfamiliar_shapes_degrade_to_unknown() {
        assert_eq!(parse("true").variant_name(), "unknown");
        assert_eq!(parse("type: [string, 'null']").variant_name(), "unknown");
        assert_eq!(parse("description: free-form").variant_name(), "unknown");
    }

    #[test]
    fn test_ref_token_normalizes_self_reference() {
        let token = RefToken::from_raw(
            "https://example.com/openapi.yaml#/components/schemas/Pet",
            Some("https://example.com/openapi.yaml"),
        );
        assert_eq!(token.as_str(), "#/components/schemas/Pet");
        assert_eq!(token.schema_name().as_deref(), Some("Pet"));
    }

    #[test]
    fn test_ref_token_escapes_names() {
        let token = RefToken::for_schema("a/b");
        assert_eq!(token.as_str(), "#/components/schemas/a~1b");
        assert_eq!(token.schema_name().as_deref(), Some("a/b"));
    }

    #[test]
    fn test_to_value_round_shape() {
        let node = parse("type: array\nitems:\n  $ref: '#/components/schemas/Pet'");
        assert_eq!(
            node.to_value(),
            json!({ "type": "array", "items": { "$ref": "#/components/schemas/Pet" } })
        );
    }
}
