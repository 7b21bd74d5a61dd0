//! Component descriptions as supplied by the host
//!
//! A component is a node in the host's declarative tree. It carries an
//! ordered list of trait declarations; the order is significant and is
//! preserved through every stage of the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Property bag attached to a trait declaration (a JSON object)
pub type PropertyBag = Map<String, Value>;

/// Identifier of one logical component instance
///
/// Stable across evaluation passes while the instance is mounted. A fresh
/// mount may be handed a new id by the host, which is what triggers
/// re-initialization of its traits.
///
/// Uses `Arc<str>` so ids can be cloned into hooks and handlers cheaply.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(Arc<str>);

impl ComponentId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One trait attached to a component: `{ "type": ..., "properties": {...} }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitDeclaration {
    /// Registered trait type name, e.g. `core/v1/state`
    #[serde(rename = "type")]
    pub trait_type: String,

    #[serde(default)]
    pub properties: PropertyBag,
}

impl TraitDeclaration {
    /// Build a declaration from a JSON value
    ///
    /// Non-object values produce an empty property bag.
    pub fn new(trait_type: impl Into<String>, properties: Value) -> Self {
        let properties = match properties {
            Value::Object(map) => map,
            _ => PropertyBag::new(),
        };
        Self {
            trait_type: trait_type.into(),
            properties,
        }
    }
}

/// Declarative description of a component in the host's tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescription {
    /// Component type understood by the host's renderer (e.g. `arco/v1/dropdown`)
    #[serde(rename = "type", default)]
    pub component_type: String,

    /// Static properties before any trait patch is applied
    #[serde(default)]
    pub properties: PropertyBag,

    /// Attached traits, in declaration order
    #[serde(default)]
    pub traits: Vec<TraitDeclaration>,
}

impl ComponentDescription {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            ..Default::default()
        }
    }

    /// Attach a trait (builder style, keeps declaration order)
    pub fn with_trait(mut self, declaration: TraitDeclaration) -> Self {
        self.traits.push(declaration);
        self
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        if let Value::Object(map) = properties {
            self.properties = map;
        }
        self
    }
}
