//! Method registry: named, invokable handlers scoped per component
//!
//! Traits contribute methods (e.g. `setValue`) that the host or other
//! components invoke by `(componentId, name)`. Handlers never capture a
//! snapshot of state; they receive a [`MethodScope`] at call time and read
//! or merge through it.

use crate::component::ComponentId;
use crate::state::{ScopedState, StateStore};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// A method body. Receives the owning component's scope and the call arguments.
pub type MethodHandler = Arc<dyn Fn(&mut MethodScope<'_>, Value) -> anyhow::Result<Value> + Send + Sync>;

/// Methods contributed by one subscription, keyed by name.
///
/// Ordered so registration follows a deterministic sequence.
#[derive(Default, Clone)]
pub struct MethodMap {
    methods: BTreeMap<String, MethodHandler>,
}

impl MethodMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a method (builder style)
    pub fn with<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut MethodScope<'_>, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for MethodMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.methods.keys()).finish()
    }
}

/// Errors surfaced by [`MethodRegistry::invoke`]
#[derive(Debug, Error)]
pub enum MethodError {
    #[error("method '{name}' not found on component '{component_id}'")]
    NotFound {
        component_id: ComponentId,
        name: String,
    },

    #[error("method '{name}' on component '{component_id}' failed: {source}")]
    Handler {
        component_id: ComponentId,
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// What a handler sees when invoked
pub struct MethodScope<'a> {
    state: ScopedState<'a>,
}

impl<'a> MethodScope<'a> {
    pub(crate) fn new(state: ScopedState<'a>) -> Self {
        Self { state }
    }

    pub fn component_id(&self) -> &ComponentId {
        self.state.component_id()
    }

    pub fn state(&mut self) -> &mut ScopedState<'a> {
        &mut self.state
    }
}

/// Registry of method records, owned by a `Runtime`
#[derive(Default)]
pub struct MethodRegistry {
    records: HashMap<ComponentId, HashMap<String, MethodHandler>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register methods for a component.
    ///
    /// A later subscription of the same name replaces the record; callers gate
    /// repeated subscription through the identity tracker.
    pub fn subscribe(&mut self, id: &ComponentId, methods: MethodMap) {
        let records = self.records.entry(id.clone()).or_default();
        for (name, handler) in methods.methods {
            tracing::debug!(component_id = %id, method = %name, "Method subscribed");
            records.insert(name, handler);
        }
    }

    pub fn contains(&self, id: &ComponentId, name: &str) -> bool {
        self.records
            .get(id)
            .is_some_and(|records| records.contains_key(name))
    }

    /// Method names registered for a component, sorted
    pub fn methods_of(&self, id: &ComponentId) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .records
            .get(id)
            .map(|records| records.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Call `name` on `id` with `args`
    pub fn invoke(
        &self,
        state: &mut StateStore,
        id: &ComponentId,
        name: &str,
        args: Value,
    ) -> Result<Value, MethodError> {
        let handler = self
            .records
            .get(id)
            .and_then(|records| records.get(name))
            .cloned()
            .ok_or_else(|| MethodError::NotFound {
                component_id: id.clone(),
                name: name.to_string(),
            })?;

        let mut scope = MethodScope::new(state.scoped(id));
        handler(&mut scope, args).map_err(|source| MethodError::Handler {
            component_id: id.clone(),
            name: name.to_string(),
            source,
        })
    }

    /// Drop all records of a component (only used by reclaim-on-unmount)
    pub(crate) fn remove(&mut self, id: &ComponentId) -> usize {
        self.records.remove(id).map(|r| r.len()).unwrap_or(0)
    }
}
