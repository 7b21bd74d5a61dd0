//! Per-component state store
//!
//! Each component owns a flat key → value map. Updates are shallow partial
//! merges: every key present in the patch replaces the stored value
//! wholesale, keys absent from the patch are left alone.
//!
//! Writes are only reachable through [`ScopedState`], a view bound to a single
//! component id. Trait contexts, lifecycle hook contexts and method scopes all
//! hand out a `ScopedState` for their own component, so there is no path for
//! one component to write another's entries.

use crate::component::ComponentId;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// State of a single component
pub type StateMap = Map<String, Value>;

/// Process-wide store of component state, owned by a `Runtime`
#[derive(Debug, Default)]
pub struct StateStore {
    components: HashMap<ComponentId, StateMap>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow key-wise union of `partial` into the component's state
    pub(crate) fn merge(&mut self, id: &ComponentId, partial: StateMap) {
        if partial.is_empty() {
            return;
        }
        let entry = self.components.entry(id.clone()).or_default();
        for (key, value) in partial {
            entry.insert(key, value);
        }
    }

    /// Read one key; `None` means the key was never written
    pub fn read(&self, id: &ComponentId, key: &str) -> Option<&Value> {
        self.components.get(id).and_then(|state| state.get(key))
    }

    /// Whole state of a component, if anything has been merged yet
    pub fn snapshot(&self, id: &ComponentId) -> Option<&StateMap> {
        self.components.get(id)
    }

    /// Drop every entry of a component (only used by reclaim-on-unmount)
    pub(crate) fn remove(&mut self, id: &ComponentId) -> Option<StateMap> {
        self.components.remove(id)
    }

    /// Number of components with state
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// View bound to one component
    pub(crate) fn scoped<'a>(&'a mut self, id: &'a ComponentId) -> ScopedState<'a> {
        ScopedState { id, store: self }
    }
}

/// Read/write access to exactly one component's state
pub struct ScopedState<'a> {
    id: &'a ComponentId,
    store: &'a mut StateStore,
}

impl<'a> ScopedState<'a> {
    pub fn component_id(&self) -> &ComponentId {
        self.id
    }

    pub fn read(&self, key: &str) -> Option<&Value> {
        self.store.read(self.id, key)
    }

    pub fn snapshot(&self) -> Option<&StateMap> {
        self.store.snapshot(self.id)
    }

    pub fn merge(&mut self, partial: StateMap) {
        tracing::trace!(
            component_id = %self.id,
            keys = ?partial.keys().collect::<Vec<_>>(),
            "Merging state"
        );
        self.store.merge(self.id, partial);
    }

    /// Convenience for the common single-key merge
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let mut partial = StateMap::new();
        partial.insert(key.into(), value);
        self.merge(partial);
    }
}
