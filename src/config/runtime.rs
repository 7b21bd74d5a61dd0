//! Runtime behavior configuration

use crate::identity::IdentityScope;
use serde::Deserialize;

/// Knobs for the trait runtime
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// How identity keys are namespaced (shared keys collide across components)
    pub identity_scope: IdentityScope,
    /// Structurally check trait properties against their schema on every pass
    pub validate_properties: bool,
    /// Drop a component's state and methods when it unmounts
    pub reclaim_on_unmount: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            identity_scope: IdentityScope::Shared,
            validate_properties: true,
            reclaim_on_unmount: false,
        }
    }
}

/// Runtime settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileRuntime {
    pub identity_scope: Option<String>,
    pub validate_properties: Option<bool>,
    pub reclaim_on_unmount: Option<bool>,
}

impl RuntimeConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileRuntime>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            identity_scope: file
                .identity_scope
                .map(|s| IdentityScope::from_str(&s))
                .unwrap_or(defaults.identity_scope),
            validate_properties: file
                .validate_properties
                .unwrap_or(defaults.validate_properties),
            reclaim_on_unmount: file
                .reclaim_on_unmount
                .unwrap_or(defaults.reclaim_on_unmount),
        }
    }

    /// Builder-style override of the identity scope
    pub fn with_identity_scope(mut self, scope: IdentityScope) -> Self {
        self.identity_scope = scope;
        self
    }
}
