//! JSON-Schema shaped type descriptions carried by contract metadata.
//!
//! Schemas are kept as a small sum type so that reference rewriting is a
//! structural walk rather than a scan over untyped JSON. Keys the gateway
//! does not interpret (`type`, `format`, `required`, `description`, ...)
//! are preserved verbatim as annotations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Location of every schema definition inside an interface document.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Errors raised while reading a schema out of metadata.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("`$ref` must be a string")]
    RefNotString,

    #[error("`$ref` must point at #/components/schemas/<name>, found `{0}`")]
    ForeignRef(String),

    #[error("`{0}` must be an array of schemas")]
    InvalidVariants(&'static str),

    #[error("`properties` must be an object")]
    InvalidProperties,

    #[error("invalid schema under `{key}`: {source}")]
    Nested {
        key: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    fn nested(key: impl Into<String>, source: SchemaError) -> Self {
        SchemaError::Nested {
            key: key.into(),
            source: Box::new(source),
        }
    }
}

/// A `$ref` to a named schema definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRef(String);

impl SchemaRef {
    /// Reference to the definition called `name`.
    pub fn to_definition(name: &str) -> Self {
        SchemaRef(format!("{SCHEMA_REF_PREFIX}{name}"))
    }

    /// Parse a raw `$ref` value.
    pub fn parse(raw: String) -> Result<Self, SchemaError> {
        if raw.starts_with(SCHEMA_REF_PREFIX) && raw.len() > SCHEMA_REF_PREFIX.len() {
            Ok(SchemaRef(raw))
        } else {
            Err(SchemaError::ForeignRef(raw))
        }
    }

    /// Name of the definition this reference points at.
    pub fn definition_name(&self) -> &str {
        &self.0[SCHEMA_REF_PREFIX.len()..]
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Schema composition keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    AllOf,
    AnyOf,
    OneOf,
}

impl Combinator {
    const ALL: [Combinator; 3] = [Combinator::AllOf, Combinator::AnyOf, Combinator::OneOf];

    pub fn keyword(self) -> &'static str {
        match self {
            Combinator::AllOf => "allOf",
            Combinator::AnyOf => "anyOf",
            Combinator::OneOf => "oneOf",
        }
    }
}

/// One node of a schema graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum SchemaNode {
    /// `{ "$ref": "#/components/schemas/<name>" }`. Sibling keys are dropped,
    /// as OpenAPI 3.0 ignores them.
    Ref(SchemaRef),
    /// A schema with `items`.
    Array {
        items: Box<SchemaNode>,
        annotations: Map<String, Value>,
    },
    /// A schema with `properties`, kept in declaration order.
    Object {
        properties: Vec<(String, SchemaNode)>,
        annotations: Map<String, Value>,
    },
    /// `allOf` / `anyOf` / `oneOf`.
    Composite {
        combinator: Combinator,
        variants: Vec<SchemaNode>,
        annotations: Map<String, Value>,
    },
    /// Anything else: primitives, untyped schemas, objects without properties.
    Leaf { annotations: Map<String, Value> },
}

impl SchemaNode {
    /// `{ "type": "object", "properties": ... }`.
    pub fn object(properties: Vec<(String, SchemaNode)>) -> Self {
        let mut annotations = Map::new();
        annotations.insert("type".to_string(), Value::String("object".to_string()));
        SchemaNode::Object {
            properties,
            annotations,
        }
    }

    fn annotations(&self) -> Option<&Map<String, Value>> {
        match self {
            SchemaNode::Ref(_) => None,
            SchemaNode::Array { annotations, .. }
            | SchemaNode::Object { annotations, .. }
            | SchemaNode::Composite { annotations, .. }
            | SchemaNode::Leaf { annotations } => Some(annotations),
        }
    }

    fn annotations_mut(&mut self) -> Option<&mut Map<String, Value>> {
        match self {
            SchemaNode::Ref(_) => None,
            SchemaNode::Array { annotations, .. }
            | SchemaNode::Object { annotations, .. }
            | SchemaNode::Composite { annotations, .. }
            | SchemaNode::Leaf { annotations } => Some(annotations),
        }
    }

    /// The declared `type` keyword, if any. References have none.
    pub fn schema_type(&self) -> Option<&str> {
        self.annotations()?.get("type")?.as_str()
    }

    /// Drop a top-level `$id`.
    pub fn strip_id(&mut self) {
        if let Some(annotations) = self.annotations_mut() {
            annotations.remove("$id");
        }
    }

    /// Visit every reference reachable from this node, depth first.
    ///
    /// Only schema positions are walked (items, properties, composition
    /// variants); a reference is a leaf of the walk.
    pub fn for_each_ref_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&mut SchemaRef),
    {
        match self {
            SchemaNode::Ref(reference) => visit(reference),
            SchemaNode::Array { items, .. } => items.for_each_ref_mut(visit),
            SchemaNode::Object { properties, .. } => {
                for (_, property) in properties {
                    property.for_each_ref_mut(visit);
                }
            }
            SchemaNode::Composite { variants, .. } => {
                for variant in variants {
                    variant.for_each_ref_mut(visit);
                }
            }
            SchemaNode::Leaf { .. } => {}
        }
    }
}

#[cfg(test)]
impl SchemaNode {
    pub fn primitive(kind: &str) -> Self {
        let mut annotations = Map::new();
        annotations.insert("type".to_string(), Value::String(kind.to_string()));
        SchemaNode::Leaf { annotations }
    }

    pub fn array(items: SchemaNode) -> Self {
        let mut annotations = Map::new();
        annotations.insert("type".to_string(), Value::String("array".to_string()));
        SchemaNode::Array {
            items: Box::new(items),
            annotations,
        }
    }

    pub fn reference(name: &str) -> Self {
        SchemaNode::Ref(SchemaRef::to_definition(name))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl TryFrom<Value> for SchemaNode {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut annotations = match value {
            Value::Object(map) => map,
            other => return Err(SchemaError::NotAnObject(json_kind(&other))),
        };

        if let Some(target) = annotations.remove("$ref") {
            return match target {
                Value::String(raw) => Ok(SchemaNode::Ref(SchemaRef::parse(raw)?)),
                _ => Err(SchemaError::RefNotString),
            };
        }

        for combinator in Combinator::ALL {
            let keyword = combinator.keyword();
            if let Some(raw) = annotations.remove(keyword) {
                let Value::Array(raw_variants) = raw else {
                    return Err(SchemaError::InvalidVariants(keyword));
                };
                let variants = raw_variants
                    .into_iter()
                    .enumerate()
                    .map(|(index, variant)| {
                        SchemaNode::try_from(variant)
                            .map_err(|e| SchemaError::nested(format!("{keyword}[{index}]"), e))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(SchemaNode::Composite {
                    combinator,
                    variants,
                    annotations,
                });
            }
        }

        if let Some(items) = annotations.remove("items") {
            let items = SchemaNode::try_from(items).map_err(|e| SchemaError::nested("items", e))?;
            return Ok(SchemaNode::Array {
                items: Box::new(items),
                annotations,
            });
        }

        if let Some(raw) = annotations.remove("properties") {
            let Value::Object(raw_properties) = raw else {
                return Err(SchemaError::InvalidProperties);
            };
            let mut properties = Vec::with_capacity(raw_properties.len());
            for (name, property) in raw_properties {
                let property = SchemaNode::try_from(property)
                    .map_err(|e| SchemaError::nested(format!("properties.{name}"), e))?;
                properties.push((name, property));
            }
            return Ok(SchemaNode::Object {
                properties,
                annotations,
            });
        }

        Ok(SchemaNode::Leaf { annotations })
    }
}

impl From<SchemaNode> for Value {
    fn from(node: SchemaNode) -> Self {
        match node {
            SchemaNode::Ref(reference) => {
                let mut map = Map::new();
                map.insert("$ref".to_string(), Value::String(reference.0));
                Value::Object(map)
            }
            SchemaNode::Array {
                items,
                mut annotations,
            } => {
                annotations.insert("items".to_string(), Value::from(*items));
                Value::Object(annotations)
            }
            SchemaNode::Object {
                properties,
                mut annotations,
            } => {
                let properties = properties
                    .into_iter()
                    .map(|(name, property)| (name, Value::from(property)))
                    .collect();
                annotations.insert("properties".to_string(), Value::Object(properties));
                Value::Object(annotations)
            }
            SchemaNode::Composite {
                combinator,
                variants,
                mut annotations,
            } => {
                let variants = variants.into_iter().map(Value::from).collect();
                annotations.insert(combinator.keyword().to_string(), Value::Array(variants));
                Value::Object(annotations)
            }
            SchemaNode::Leaf { annotations } => Value::Object(annotations),
        }
    }
}
