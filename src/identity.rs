//! Identity tracking for exactly-once trait initialization
//!
//! Trait implementations run on every evaluation pass. Work that must only
//! happen once per logical instance (registering methods, for example) is
//! gated on an [`IdentityKey`]: the first pass that finds the key unmarked
//! marks it and runs the one-time branch, every later pass skips it. The
//! component's unmount hook clears the key so a later mount initializes again.
//!
//! # Collision semantics
//!
//! Under [`IdentityScope::Shared`] (the default) the key is derived from the
//! trait-chosen discriminator alone. Two different component ids that pick
//! the same discriminator therefore share one initialization slot, and the
//! second one to evaluate skips its own initialization. Callers that need
//! independent initialization must pick unique discriminators, or opt into
//! [`IdentityScope::Component`], which folds the component id into the key.

use crate::component::ComponentId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// How identity keys are namespaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityScope {
    /// Key is `@<discriminator>`; equal discriminators collide across components
    #[default]
    Shared,
    /// Key is `#<componentId>@<discriminator>`
    Component,
}

impl IdentityScope {
    /// Parse scope string from config (unknown values fall back to shared)
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "component" => Self::Component,
            _ => Self::Shared,
        }
    }

    /// Convert to string for TOML serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Component => "component",
        }
    }
}

/// One slot of one-time initialization
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Derive the key for `(component, discriminator)` under `scope`
    pub fn derive(scope: IdentityScope, component: &ComponentId, discriminator: &str) -> Self {
        match scope {
            IdentityScope::Shared => Self(format!("@{}", discriminator)),
            IdentityScope::Component => Self(format!("#{}@{}", component, discriminator)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity keys whose initialization has run and not been torn down
///
/// Each key remembers the component that marked it, so unmount can release
/// every slot a component owns even when its unmount hooks are missing
/// (for example, the trait that would contribute them failed on the last pass).
#[derive(Debug, Default)]
pub struct IdentityTracker {
    initialized: HashMap<IdentityKey, ComponentId>,
}

impl IdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_initialized(&self, key: &IdentityKey) -> bool {
        self.initialized.contains_key(key)
    }

    /// Component that marked `key`, if it is marked
    pub fn owner(&self, key: &IdentityKey) -> Option<&ComponentId> {
        self.initialized.get(key)
    }

    /// Mark a key as initialized by `owner`. Returns `false` if it already was;
    /// the first owner is kept.
    pub fn mark_initialized(&mut self, key: IdentityKey, owner: &ComponentId) -> bool {
        match self.initialized.entry(key) {
            Entry::Occupied(entry) => {
                tracing::trace!(
                    identity = %entry.key(),
                    owner = %entry.get(),
                    "Identity already initialized"
                );
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(owner.clone());
                true
            }
        }
    }

    /// Forget a key unconditionally. Returns whether it was present.
    pub fn clear(&mut self, key: &IdentityKey) -> bool {
        let removed = self.initialized.remove(key).is_some();
        tracing::debug!(identity = %key, removed, "Identity cleared");
        removed
    }

    /// Forget every key marked by `owner`, returning them sorted
    pub fn release_owned(&mut self, owner: &ComponentId) -> Vec<IdentityKey> {
        let mut released: Vec<IdentityKey> = self
            .initialized
            .iter()
            .filter(|(_, o)| *o == owner)
            .map(|(key, _)| key.clone())
            .collect();
        released.sort();

        for key in &released {
            self.initialized.remove(key);
        }
        released
    }

    /// Number of live initialization slots
    pub fn len(&self) -> usize {
        self.initialized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.initialized.is_empty()
    }
}
