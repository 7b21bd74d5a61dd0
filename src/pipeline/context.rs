//! Runtime context handed to a trait implementation on every pass

use crate::component::ComponentId;
use crate::identity::{IdentityKey, IdentityScope, IdentityTracker};
use crate::methods::{MethodMap, MethodRegistry};
use crate::state::{ScopedState, StateMap};

/// View of the runtime bound to the component being evaluated
///
/// Exposes the component's state, the `merge_state` and `subscribe_methods`
/// operations, and identity helpers for gating one-time work.
pub struct TraitContext<'a> {
    component_id: &'a ComponentId,
    scope: IdentityScope,
    state: ScopedState<'a>,
    methods: &'a mut MethodRegistry,
    identities: &'a mut IdentityTracker,
}

impl<'a> TraitContext<'a> {
    pub(crate) fn new(
        component_id: &'a ComponentId,
        scope: IdentityScope,
        state: ScopedState<'a>,
        methods: &'a mut MethodRegistry,
        identities: &'a mut IdentityTracker,
    ) -> Self {
        Self {
            component_id,
            scope,
            state,
            methods,
            identities,
        }
    }

    pub fn component_id(&self) -> &ComponentId {
        self.component_id
    }

    /// Current state of this component (read-only)
    pub fn state(&self) -> &ScopedState<'a> {
        &self.state
    }

    pub fn merge_state(&mut self, partial: StateMap) {
        self.state.merge(partial);
    }

    /// Register methods under this component
    pub fn subscribe_methods(&mut self, methods: MethodMap) {
        self.methods.subscribe(self.component_id, methods);
    }

    /// Identity key for `discriminator` under the runtime's scope
    pub fn identity(&self, discriminator: &str) -> IdentityKey {
        IdentityKey::derive(self.scope, self.component_id, discriminator)
    }

    pub fn has_initialized(&self, key: &IdentityKey) -> bool {
        self.identities.has_initialized(key)
    }

    /// Mark `key` as initialized by this component
    pub fn mark_initialized(&mut self, key: IdentityKey) -> bool {
        self.identities.mark_initialized(key, self.component_id)
    }

    /// Run `init` once per identity key.
    ///
    /// The key is marked before `init` runs, so anything `init` triggers that
    /// re-enters this trait sees the slot as taken. If `init` fails the mark
    /// is rolled back and the next pass tries again.
    ///
    /// Returns `Ok(true)` when `init` ran, `Ok(false)` when it was skipped.
    pub fn init_once<F>(&mut self, key: &IdentityKey, init: F) -> anyhow::Result<bool>
    where
        F: FnOnce(&mut Self) -> anyhow::Result<()>,
    {
        if self.identities.has_initialized(key) {
            return Ok(false);
        }

        self.identities.mark_initialized(key.clone(), self.component_id);
        tracing::debug!(
            component_id = %self.component_id,
            identity = %key,
            "Running one-time trait initialization"
        );

        if let Err(e) = init(self) {
            self.identities.clear(key);
            return Err(e);
        }
        Ok(true)
    }
}
