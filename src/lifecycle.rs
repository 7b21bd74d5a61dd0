//! Lifecycle hook bus
//!
//! Traits return mount and unmount callbacks from every pass. The pipeline
//! concatenates them in declaration order and the host fires one list per
//! mount or unmount event.
//!
//! # Fail-Safe Guarantee
//!
//! Firing a phase ALWAYS runs every hook in the list. A failing hook is
//! recorded as a [`HookFailure`] and the next hook still runs, so an unmount
//! hook that releases an identity can never be skipped because a sibling
//! hook failed first.

use crate::component::ComponentId;
use crate::identity::{IdentityKey, IdentityTracker};
use crate::state::ScopedState;
use std::sync::Arc;
use thiserror::Error;

/// The two phases a hook can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Mount,
    Unmount,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Mount => "mount",
            Phase::Unmount => "unmount",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback body
pub type HookFn = Arc<dyn Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// What a hook sees when fired
pub struct HookContext<'a> {
    state: ScopedState<'a>,
    identities: &'a mut IdentityTracker,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(state: ScopedState<'a>, identities: &'a mut IdentityTracker) -> Self {
        Self { state, identities }
    }

    pub fn component_id(&self) -> &ComponentId {
        self.state.component_id()
    }

    pub fn state(&mut self) -> &mut ScopedState<'a> {
        &mut self.state
    }

    /// Tear down an initialization slot. Infallible and unconditional.
    pub fn release_identity(&mut self, key: &IdentityKey) -> bool {
        self.identities.clear(key)
    }
}

/// A callback tagged with the trait that contributed it
#[derive(Clone)]
pub struct LifecycleHook {
    trait_type: Arc<str>,
    callback: HookFn,
}

impl LifecycleHook {
    pub fn new<F>(trait_type: &str, callback: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            trait_type: Arc::from(trait_type),
            callback: Arc::new(callback),
        }
    }

    pub fn trait_type(&self) -> &str {
        &self.trait_type
    }

    /// Re-tag a hook (the pipeline stamps hooks with the declaring trait type)
    pub(crate) fn tagged(mut self, trait_type: &Arc<str>) -> Self {
        self.trait_type = Arc::clone(trait_type);
        self
    }
}

impl std::fmt::Debug for LifecycleHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleHook")
            .field("trait_type", &self.trait_type)
            .finish_non_exhaustive()
    }
}

/// A hook that returned an error while its phase was being fired
#[derive(Debug, Error)]
#[error("{phase} hook #{index} from trait '{trait_type}' on component '{component_id}' failed: {source}")]
pub struct HookFailure {
    pub component_id: ComponentId,
    pub trait_type: String,
    pub phase: Phase,
    /// Position of the hook in the aggregated list
    pub index: usize,
    #[source]
    pub source: anyhow::Error,
}

/// Ordered mount/unmount hook lists for one component
#[derive(Debug, Clone, Default)]
pub struct LifecycleHooks {
    pub on_mount: Vec<LifecycleHook>,
    pub on_unmount: Vec<LifecycleHook>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_mount<F>(mut self, trait_type: &str, callback: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_mount.push(LifecycleHook::new(trait_type, callback));
        self
    }

    pub fn on_unmount<F>(mut self, trait_type: &str, callback: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_unmount.push(LifecycleHook::new(trait_type, callback));
        self
    }

    /// Append another trait's hooks after ours
    pub fn extend(&mut self, other: LifecycleHooks) {
        self.on_mount.extend(other.on_mount);
        self.on_unmount.extend(other.on_unmount);
    }

    pub fn is_empty(&self) -> bool {
        self.on_mount.is_empty() && self.on_unmount.is_empty()
    }

    pub fn hooks(&self, phase: Phase) -> &[LifecycleHook] {
        match phase {
            Phase::Mount => &self.on_mount,
            Phase::Unmount => &self.on_unmount,
        }
    }

    /// Run every hook of `phase` in order, collecting failures
    pub fn fire(&self, phase: Phase, ctx: &mut HookContext<'_>) -> Vec<HookFailure> {
        let mut failures = Vec::new();

        for (index, hook) in self.hooks(phase).iter().enumerate() {
            if let Err(source) = (hook.callback)(ctx) {
                tracing::warn!(
                    component_id = %ctx.component_id(),
                    trait_type = hook.trait_type(),
                    phase = %phase,
                    error = %source,
                    "Lifecycle hook failed, continuing with remaining hooks"
                );
                failures.push(HookFailure {
                    component_id: ctx.component_id().clone(),
                    trait_type: hook.trait_type().to_string(),
                    phase,
                    index,
                    source,
                });
            }
        }

        failures
    }
}
