//! Trait pipeline: ordered application of a component's traits
//!
//! # Architecture
//!
//! ```text
//! ComponentInstance → TraitPipeline → [Trait₁, Trait₂, ...] → Evaluation
//!                                        │
//!                                        ├─ props patch   (shallow, last write wins)
//!                                        ├─ mount hooks   (concatenated in order)
//!                                        └─ unmount hooks (concatenated in order)
//! ```
//!
//! The host calls the pipeline once per evaluation pass. Trait
//! implementations are therefore re-entrant: every call recomputes the
//! patch and hooks, and one-time work is gated through the identity
//! tracker exposed on [`TraitContext`].
//!
//! # Fail-Safe Guarantee
//!
//! One trait failing never fails the pass. The failure is logged and
//! reported, that trait's contribution is skipped, and its siblings still
//! apply. Worst case: the component renders with its base properties.

mod context;

pub use context::TraitContext;

use crate::component::{ComponentId, PropertyBag, TraitDeclaration};
use crate::identity::{IdentityScope, IdentityTracker};
use crate::lifecycle::LifecycleHooks;
use crate::methods::MethodRegistry;
use crate::schema::{SchemaViolation, TraitSpec};
use crate::state::StateStore;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Trait Output
// ============================================================================

/// Everything one trait contributes to its component in one pass
#[derive(Debug, Default)]
pub struct TraitOutput {
    /// Property overrides (top-level keys only)
    pub props_patch: PropertyBag,
    pub lifecycle: LifecycleHooks,
}

impl TraitOutput {
    /// Output with neither patch nor hooks
    pub fn empty() -> Self {
        Self::default()
    }

    /// Output carrying only a props patch. Non-object values are ignored.
    pub fn patch(props: Value) -> Self {
        let props_patch = match props {
            Value::Object(map) => map,
            _ => PropertyBag::new(),
        };
        Self {
            props_patch,
            ..Self::default()
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: LifecycleHooks) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

// ============================================================================
// Trait Implementation
// ============================================================================

/// A trait implementation, created by a factory for one attachment
///
/// # Re-entrancy Contract
///
/// `apply` runs on every evaluation pass, not just at mount. It must be
/// safe to call any number of times: side effects that should happen once
/// go through [`TraitContext::init_once`], everything else is recomputed.
///
/// Return an error rather than panicking; the pipeline logs it and skips
/// this trait for the pass.
pub trait TraitImpl: Send + Sync {
    fn apply(
        &self,
        properties: &PropertyBag,
        ctx: &mut TraitContext<'_>,
    ) -> anyhow::Result<TraitOutput>;
}

// ============================================================================
// Errors
// ============================================================================

/// Why a trait's contribution was skipped
#[derive(Debug, Error)]
pub enum TraitFailure {
    #[error("invalid properties {0}")]
    InvalidProperties(#[from] SchemaViolation),

    #[error("{0}")]
    Failed(anyhow::Error),
}

/// A trait that failed during one pass
#[derive(Debug, Error)]
#[error("trait '{trait_type}' (#{index}) on component '{component_id}': {failure}")]
pub struct TraitApplicationError {
    pub component_id: ComponentId,
    pub trait_type: String,
    /// Declaration index within the component
    pub index: usize,
    #[source]
    pub failure: TraitFailure,
}

// ============================================================================
// Evaluation
// ============================================================================

/// Merged result of one pass over a component
#[derive(Debug, Default)]
pub struct Evaluation {
    /// Merged patches of all traits that applied
    pub props_patch: PropertyBag,
    /// Base properties overlaid with `props_patch`
    pub props: PropertyBag,
    pub hooks: LifecycleHooks,
    pub failures: Vec<TraitApplicationError>,
}

impl Evaluation {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Borrowed runtime stores for one pass
pub(crate) struct PassEnv<'a> {
    pub state: &'a mut StateStore,
    pub methods: &'a mut MethodRegistry,
    pub identities: &'a mut IdentityTracker,
    pub scope: IdentityScope,
    pub validate_properties: bool,
}

// ============================================================================
// Trait Pipeline
// ============================================================================

/// A declaration bound to its resolved implementation
pub struct AttachedTrait {
    declaration: TraitDeclaration,
    type_tag: Arc<str>,
    spec: Arc<TraitSpec>,
    implementation: Box<dyn TraitImpl>,
}

impl AttachedTrait {
    pub fn new(
        declaration: TraitDeclaration,
        spec: Arc<TraitSpec>,
        implementation: Box<dyn TraitImpl>,
    ) -> Self {
        Self {
            type_tag: Arc::from(declaration.trait_type.as_str()),
            declaration,
            spec,
            implementation,
        }
    }

    pub fn declaration(&self) -> &TraitDeclaration {
        &self.declaration
    }

    pub fn spec(&self) -> &TraitSpec {
        &self.spec
    }

    pub(crate) fn set_properties(&mut self, properties: PropertyBag) {
        self.declaration.properties = properties;
    }
}

/// Ordered traits of one component
#[derive(Default)]
pub struct TraitPipeline {
    traits: Vec<AttachedTrait>,
}

impl TraitPipeline {
    /// Create an empty pipeline (passthrough)
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a trait. Traits apply in attachment order.
    pub fn register(&mut self, attached: AttachedTrait) {
        self.traits.push(attached);
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    /// Get trait type names in order (for logging/debug)
    pub fn trait_types(&self) -> Vec<&str> {
        self.traits
            .iter()
            .map(|t| t.declaration.trait_type.as_str())
            .collect()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut AttachedTrait> {
        self.traits.get_mut(index)
    }

    /// Run every trait for `component_id` and merge their outputs
    pub(crate) fn apply(
        &self,
        component_id: &ComponentId,
        base: &PropertyBag,
        env: &mut PassEnv<'_>,
    ) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for (index, attached) in self.traits.iter().enumerate() {
            let properties = &attached.declaration.properties;

            if env.validate_properties {
                let checked = attached
                    .spec
                    .properties
                    .check(&Value::Object(properties.clone()));
                if let Err(violation) = checked {
                    report(
                        &mut evaluation,
                        component_id,
                        attached,
                        index,
                        TraitFailure::InvalidProperties(violation),
                    );
                    continue;
                }
            }

            let mut ctx = TraitContext::new(
                component_id,
                env.scope,
                env.state.scoped(component_id),
                &mut *env.methods,
                &mut *env.identities,
            );

            match attached.implementation.apply(properties, &mut ctx) {
                Ok(output) => {
                    tracing::trace!(
                        component_id = %component_id,
                        trait_type = %attached.type_tag,
                        patched = output.props_patch.len(),
                        "Trait applied"
                    );
                    let TraitOutput {
                        props_patch,
                        lifecycle,
                    } = output;
                    evaluation.props_patch.extend(props_patch);
                    evaluation.hooks.extend(LifecycleHooks {
                        on_mount: lifecycle
                            .on_mount
                            .into_iter()
                            .map(|h| h.tagged(&attached.type_tag))
                            .collect(),
                        on_unmount: lifecycle
                            .on_unmount
                            .into_iter()
                            .map(|h| h.tagged(&attached.type_tag))
                            .collect(),
                    });
                }
                Err(error) => {
                    report(
                        &mut evaluation,
                        component_id,
                        attached,
                        index,
                        TraitFailure::Failed(error),
                    );
                }
            }
        }

        evaluation.props = base.clone();
        evaluation
            .props
            .extend(evaluation.props_patch.iter().map(|(k, v)| (k.clone(), v.clone())));
        evaluation
    }
}

/// Log and record a skipped trait
fn report(
    evaluation: &mut Evaluation,
    component_id: &ComponentId,
    attached: &AttachedTrait,
    index: usize,
    failure: TraitFailure,
) {
    // LOG AND CONTINUE - a failing trait never fails the pass
    tracing::warn!(
        component_id = %component_id,
        trait_type = %attached.type_tag,
        index,
        error = %failure,
        "Trait {} failed, skipping its contribution",
        attached.type_tag
    );
    evaluation.failures.push(TraitApplicationError {
        component_id: component_id.clone(),
        trait_type: attached.declaration.trait_type.clone(),
        index,
        failure,
    });
}

// ============================================================================
// Tests
// ============================================================================
