//! Runtime construction errors

use crate::component::ComponentId;
use thiserror::Error;

/// Errors raised while building the runtime or a component instance
///
/// Evaluation itself never fails as a whole: per-trait faults are reported
/// as `TraitApplicationError`s in the pass result.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unknown trait type '{trait_type}' on component '{component_id}'")]
    UnknownTraitType {
        component_id: ComponentId,
        trait_type: String,
    },

    #[error("trait type '{0}' is already registered")]
    DuplicateTraitType(String),

    #[error("component '{component_id}' has no trait at index {index}")]
    NoSuchTrait {
        component_id: ComponentId,
        index: usize,
    },
}
