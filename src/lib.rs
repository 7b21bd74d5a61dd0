//! Trellis - trait composition runtime for declarative components
//!
//! Components are assembled by attaching traits: reusable behavior modules
//! contributing property patches, state, lifecycle hooks and methods. The
//! host re-evaluates every component on each pass; the runtime keeps trait
//! side effects exactly-once per identity across those passes.
//!
//! Architecture:
//! - Runtime: facade owning all stores, driven by the host
//! - Pipeline: applies a component's traits in order and merges outputs
//! - State store / method registry: per-component, written through scoped views
//! - Identity tracker: one-time initialization slots, released on unmount
//! - Lifecycle: ordered mount/unmount hooks aggregated across traits
//! - Traits: type registry plus the built-in `core/v1/state` trait
//! - Bindings: headless dropdown and record editor built on the public API

pub mod bindings;
pub mod component;
pub mod config;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod methods;
pub mod pipeline;
pub mod runtime;
pub mod schema;
pub mod state;
pub mod traits;

pub use component::{ComponentDescription, ComponentId, PropertyBag, TraitDeclaration};
pub use config::{Config, RuntimeConfig};
pub use error::RuntimeError;
pub use identity::{IdentityKey, IdentityScope};
pub use lifecycle::{HookFailure, LifecycleHooks, Phase};
pub use methods::{MethodError, MethodMap};
pub use pipeline::{Evaluation, TraitContext, TraitImpl, TraitOutput};
pub use runtime::{ComponentInstance, Runtime};
pub use schema::{Schema, TraitSpec};
pub use traits::{TraitFactory, TraitRegistry};
