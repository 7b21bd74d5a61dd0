//! Host-facing runtime facade
//!
//! A [`Runtime`] owns one state store, method registry, identity tracker
//! and trait registry. Nothing is process-global: two runtimes never share
//! initialization slots, which keeps independent hosts (and tests) isolated.
//!
//! # Host Protocol
//!
//! ```text
//! instantiate(id, description)       once per logical instance
//!   loop:
//!     evaluate(&instance)            every pass → props + hooks + failures
//!     mount(id, &hooks)              when the instance first appears
//!     unmount(id, &hooks)            when it leaves the tree
//! invoke(id, name, args)             any time between passes
//! ```
//!
//! All calls are synchronous; `&mut self` sequences them.

use crate::component::{ComponentDescription, ComponentId, PropertyBag};
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::identity::{IdentityKey, IdentityTracker};
use crate::lifecycle::{HookContext, HookFailure, LifecycleHooks, Phase};
use crate::methods::{MethodError, MethodRegistry};
use crate::pipeline::{AttachedTrait, Evaluation, PassEnv, TraitPipeline};
use crate::state::{StateMap, StateStore};
use crate::traits::TraitRegistry;
use serde_json::Value;

#[cfg(test)]
mod tests;

/// A component bound to its resolved trait implementations
pub struct ComponentInstance {
    id: ComponentId,
    description: ComponentDescription,
    pipeline: TraitPipeline,
}

impl ComponentInstance {
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn description(&self) -> &ComponentDescription {
        &self.description
    }

    pub fn trait_types(&self) -> Vec<&str> {
        self.pipeline.trait_types()
    }

    /// Replace the properties of the trait declared at `index`
    ///
    /// Takes effect on the next evaluation pass. Mount-time work is not
    /// re-run; a changed discriminator only matters once hooks fire again.
    pub fn reconfigure(&mut self, index: usize, properties: Value) -> Result<(), RuntimeError> {
        let properties = match properties {
            Value::Object(map) => map,
            _ => PropertyBag::new(),
        };

        let attached = self
            .pipeline
            .get_mut(index)
            .ok_or_else(|| RuntimeError::NoSuchTrait {
                component_id: self.id.clone(),
                index,
            })?;
        attached.set_properties(properties.clone());
        self.description.traits[index].properties = properties;
        Ok(())
    }
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("component_type", &self.description.component_type)
            .field("traits", &self.pipeline.trait_types())
            .finish()
    }
}

/// The trait runtime
pub struct Runtime {
    config: RuntimeConfig,
    registry: TraitRegistry,
    state: StateStore,
    methods: MethodRegistry,
    identities: IdentityTracker,
}

impl Runtime {
    /// Runtime with the built-in traits registered
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_registry(config, TraitRegistry::with_builtins())
    }

    pub fn with_registry(config: RuntimeConfig, registry: TraitRegistry) -> Self {
        Self {
            config,
            registry,
            state: StateStore::new(),
            methods: MethodRegistry::new(),
            identities: IdentityTracker::new(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &TraitRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TraitRegistry {
        &mut self.registry
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tree construction
    // ─────────────────────────────────────────────────────────────────────

    /// Resolve every trait declaration of `description` into an implementation
    pub fn instantiate(
        &self,
        id: ComponentId,
        description: ComponentDescription,
    ) -> Result<ComponentInstance, RuntimeError> {
        let mut pipeline = TraitPipeline::new();

        for declaration in &description.traits {
            let (spec, implementation) =
                self.registry
                    .resolve(&declaration.trait_type)
                    .ok_or_else(|| RuntimeError::UnknownTraitType {
                        component_id: id.clone(),
                        trait_type: declaration.trait_type.clone(),
                    })?;
            pipeline.register(AttachedTrait::new(declaration.clone(), spec, implementation));
        }

        tracing::debug!(
            component_id = %id,
            component_type = %description.component_type,
            traits = pipeline.len(),
            "Component instantiated"
        );

        Ok(ComponentInstance {
            id,
            description,
            pipeline,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Evaluation and lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Apply the instance's traits for one pass
    pub fn evaluate(&mut self, instance: &ComponentInstance) -> Evaluation {
        let mut env = PassEnv {
            state: &mut self.state,
            methods: &mut self.methods,
            identities: &mut self.identities,
            scope: self.config.identity_scope,
            validate_properties: self.config.validate_properties,
        };
        instance
            .pipeline
            .apply(&instance.id, &instance.description.properties, &mut env)
    }

    /// Fire the mount hooks collected for `id`
    pub fn mount(&mut self, id: &ComponentId, hooks: &LifecycleHooks) -> Vec<HookFailure> {
        tracing::debug!(component_id = %id, hooks = hooks.on_mount.len(), "Mounting component");
        self.fire(id, hooks, Phase::Mount)
    }

    /// Fire the unmount hooks collected for `id`
    ///
    /// Every hook runs even if an earlier one fails. Afterwards every
    /// identity slot `id` marked is released, so a pass whose traits failed
    /// (and therefore contributed no unmount hooks) cannot leak a slot. With
    /// `reclaim_on_unmount` the component's state and methods are dropped too.
    pub fn unmount(&mut self, id: &ComponentId, hooks: &LifecycleHooks) -> Vec<HookFailure> {
        tracing::debug!(component_id = %id, hooks = hooks.on_unmount.len(), "Unmounting component");
        let failures = self.fire(id, hooks, Phase::Unmount);

        let released = self.identities.release_owned(id);
        if !released.is_empty() {
            tracing::debug!(
                component_id = %id,
                identities = ?released.iter().map(IdentityKey::as_str).collect::<Vec<_>>(),
                "Released identities not cleared by unmount hooks"
            );
        }

        if self.config.reclaim_on_unmount {
            self.state.remove(id);
            let dropped = self.methods.remove(id);
            tracing::trace!(component_id = %id, methods = dropped, "Reclaimed component");
        }

        failures
    }

    fn fire(&mut self, id: &ComponentId, hooks: &LifecycleHooks, phase: Phase) -> Vec<HookFailure> {
        let mut ctx = HookContext::new(self.state.scoped(id), &mut self.identities);
        hooks.fire(phase, &mut ctx)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Public contract for hosts and presentation bindings
    // ─────────────────────────────────────────────────────────────────────

    /// Invoke a method registered on `id`
    pub fn invoke(&mut self, id: &ComponentId, name: &str, args: Value) -> Result<Value, MethodError> {
        let result = self.methods.invoke(&mut self.state, id, name, args);
        if let Err(e) = &result {
            tracing::debug!(component_id = %id, method = name, error = %e, "Method invocation failed");
        }
        result
    }

    /// Merge a partial state into `id`'s state
    pub fn merge_state(&mut self, id: &ComponentId, partial: StateMap) {
        self.state.scoped(id).merge(partial);
    }

    pub fn state(&self, id: &ComponentId) -> Option<&StateMap> {
        self.state.snapshot(id)
    }

    pub fn read_state(&self, id: &ComponentId, key: &str) -> Option<&Value> {
        self.state.read(id, key)
    }

    pub fn methods_of(&self, id: &ComponentId) -> Vec<&str> {
        self.methods.methods_of(id)
    }

    /// Identity key the runtime derives for `(id, discriminator)`
    pub fn identity_key(&self, id: &ComponentId, discriminator: &str) -> IdentityKey {
        IdentityKey::derive(self.config.identity_scope, id, discriminator)
    }

    pub fn has_initialized(&self, key: &IdentityKey) -> bool {
        self.identities.has_initialized(key)
    }

    /// Number of live initialization slots
    pub fn initialized_count(&self) -> usize {
        self.identities.len()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
