//! Trait type registry
//!
//! Maps trait type names (`<version>/<name>`, e.g. `core/v1/state`) to
//! factories. A component instance resolves each declaration once, at
//! construction time, and keeps the created implementation for its whole
//! lifetime; evaluation passes never look types up again.

mod state;

pub use state::{StateTrait, StateTraitFactory, STATE_TRAIT};

use crate::error::RuntimeError;
use crate::pipeline::TraitImpl;
use crate::schema::TraitSpec;
use std::collections::HashMap;
use std::sync::Arc;

/// Produces trait implementations of one type
///
/// `create` is called once per attachment, so an implementation may keep
/// per-attachment data (such as the latest configured value) in itself.
pub trait TraitFactory: Send + Sync {
    fn spec(&self) -> TraitSpec;

    fn create(&self) -> Box<dyn TraitImpl>;
}

/// Factory built from a spec and a constructor function
pub struct FnTraitFactory<F> {
    spec: TraitSpec,
    create: F,
}

impl<F> FnTraitFactory<F> {
    pub fn new(spec: TraitSpec, create: F) -> Self
    where
        F: Fn() -> Box<dyn TraitImpl> + Send + Sync,
    {
        Self { spec, create }
    }
}

impl<F> TraitFactory for FnTraitFactory<F>
where
    F: Fn() -> Box<dyn TraitImpl> + Send + Sync,
{
    fn spec(&self) -> TraitSpec {
        self.spec.clone()
    }

    fn create(&self) -> Box<dyn TraitImpl> {
        (self.create)()
    }
}

struct Registered {
    spec: Arc<TraitSpec>,
    factory: Box<dyn TraitFactory>,
}

/// Registry of known trait types
#[derive(Default)]
pub struct TraitRegistry {
    types: HashMap<String, Registered>,
}

impl TraitRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `core/v1` traits
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        // Fresh registry, so the builtin names cannot collide
        let _ = registry.register(StateTraitFactory);
        registry
    }

    /// Register a factory under its spec's type name
    pub fn register(
        &mut self,
        factory: impl TraitFactory + 'static,
    ) -> Result<(), RuntimeError> {
        let spec = factory.spec();
        let type_name = spec.type_name();

        if self.types.contains_key(&type_name) {
            return Err(RuntimeError::DuplicateTraitType(type_name));
        }

        tracing::debug!(
            trait_type = %type_name,
            methods = spec.methods.len(),
            "Registered trait type"
        );
        self.types.insert(
            type_name,
            Registered {
                spec: Arc::new(spec),
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    pub fn contains(&self, trait_type: &str) -> bool {
        self.types.contains_key(trait_type)
    }

    pub fn spec(&self, trait_type: &str) -> Option<&TraitSpec> {
        self.types.get(trait_type).map(|r| r.spec.as_ref())
    }

    /// Resolve a type name into its spec and a fresh implementation
    pub(crate) fn resolve(
        &self,
        trait_type: &str,
    ) -> Option<(Arc<TraitSpec>, Box<dyn TraitImpl>)> {
        self.types
            .get(trait_type)
            .map(|r| (Arc::clone(&r.spec), r.factory.create()))
    }

    /// All registered specs, sorted by type name (for tooling)
    pub fn specs(&self) -> Vec<&TraitSpec> {
        let mut specs: Vec<&TraitSpec> = self.types.values().map(|r| r.spec.as_ref()).collect();
        specs.sort_by_key(|spec| spec.type_name());
        specs
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
