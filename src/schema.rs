//! Structural schemas for trait metadata
//!
//! Each trait type publishes the shape of its properties, the state it may
//! contribute and the methods it registers. The runtime only performs
//! structural checks with these (type of each value, required object
//! fields); richer validation belongs to tooling built on the serialized form.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Shape of a JSON value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Schema {
    Any,
    String,
    Number,
    Boolean,
    Array {
        items: Box<Schema>,
    },
    Object {
        properties: Vec<Field>,
    },
}

/// Named member of an object schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub required: bool,
    pub schema: Schema,
}

impl Field {
    pub fn required(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            title: None,
            required: true,
            schema,
        }
    }

    pub fn optional(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            required: false,
            ..Self::required(name, schema)
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// First structural mismatch found by [`Schema::check`]
#[derive(Debug, Clone, PartialEq, Error)]
#[error("at '{path}': expected {expected}")]
pub struct SchemaViolation {
    /// Slash-separated location, `/` for the root
    pub path: String,
    pub expected: String,
}

impl Schema {
    pub fn object(properties: Vec<Field>) -> Self {
        Schema::Object { properties }
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Schema::Any => "any value",
            Schema::String => "a string",
            Schema::Number => "a number",
            Schema::Boolean => "a boolean",
            Schema::Array { .. } => "an array",
            Schema::Object { .. } => "an object",
        }
    }

    /// Check `value` against this schema
    pub fn check(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.check_at(value, "")
    }

    fn check_at(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let violation = |expected: String| SchemaViolation {
            path: if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            },
            expected,
        };

        match (self, value) {
            (Schema::Any, _) => Ok(()),
            (Schema::String, Value::String(_)) => Ok(()),
            (Schema::Number, Value::Number(_)) => Ok(()),
            (Schema::Boolean, Value::Bool(_)) => Ok(()),
            (Schema::Array { items }, Value::Array(values)) => {
                for (i, item) in values.iter().enumerate() {
                    items.check_at(item, &format!("{}/{}", path, i))?;
                }
                Ok(())
            }
            (Schema::Object { properties }, Value::Object(map)) => {
                for field in properties {
                    let child = format!("{}/{}", path, field.name);
                    match map.get(&field.name) {
                        Some(v) => field.schema.check_at(v, &child)?,
                        None if field.required => {
                            return Err(SchemaViolation {
                                path: child,
                                expected: format!("required {}", field.schema.describe()),
                            })
                        }
                        None => {}
                    }
                }
                Ok(())
            }
            (schema, _) => Err(violation(schema.describe().to_string())),
        }
    }
}

/// Method name plus parameter shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Schema>,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>, parameters: Option<Schema>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// Static metadata published by each trait type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitSpec {
    /// Version namespace, e.g. `core/v1`
    pub version: String,
    pub name: String,
    pub description: String,
    pub properties: Schema,
    pub state: Schema,
    pub methods: Vec<MethodSpec>,
}

impl TraitSpec {
    /// Fully-qualified type name used in declarations: `<version>/<name>`
    pub fn type_name(&self) -> String {
        format!("{}/{}", self.version, self.name)
    }
}
