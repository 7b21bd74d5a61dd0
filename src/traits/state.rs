//! `core/v1/state`: adds a keyed piece of state to a component
//!
//! Properties: `key` (state key, also the identity discriminator) and
//! `initialValue` (seeded on mount).
//!
//! On every pass the trait:
//! - records the current `initialValue` for `resetValue`,
//! - subscribes `setValue` / `resetValue` once per identity,
//! - returns a mount hook seeding `{key: initialValue}` and an unmount hook
//!   releasing the identity.

use super::TraitFactory;
use crate::component::PropertyBag;
use crate::lifecycle::LifecycleHooks;
use crate::methods::MethodMap;
use crate::pipeline::{TraitContext, TraitImpl, TraitOutput};
use crate::schema::{Field, MethodSpec, Schema, TraitSpec};
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

/// Type name of the state trait
pub const STATE_TRAIT: &str = "core/v1/state";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateProperties {
    key: String,
    #[serde(default)]
    initial_value: Value,
}

/// Arguments of `setValue`
#[derive(Debug, Deserialize)]
struct SetValueArgs {
    key: String,
    #[serde(default)]
    value: Value,
}

/// Arguments of `resetValue`
#[derive(Debug, Deserialize)]
struct ResetValueArgs {
    key: String,
}

/// Factory for [`StateTrait`]
pub struct StateTraitFactory;

impl TraitFactory for StateTraitFactory {
    fn spec(&self) -> TraitSpec {
        TraitSpec {
            version: "core/v1".to_string(),
            name: "state".to_string(),
            description: "add state to component".to_string(),
            properties: Schema::object(vec![
                Field::required("key", Schema::String).titled("Key"),
                Field::optional("initialValue", Schema::Any).titled("Initial Value"),
            ]),
            state: Schema::Any,
            methods: vec![
                MethodSpec::new(
                    "setValue",
                    Some(Schema::object(vec![
                        Field::required("key", Schema::String),
                        Field::optional("value", Schema::Any),
                    ])),
                ),
                MethodSpec::new(
                    "resetValue",
                    Some(Schema::object(vec![Field::required("key", Schema::String)])),
                ),
            ],
        }
    }

    fn create(&self) -> Box<dyn TraitImpl> {
        Box::new(StateTrait::new())
    }
}

/// One attachment of the state trait
pub struct StateTrait {
    /// `initialValue` as of the most recent pass, read by `resetValue`
    latest_initial: Arc<Mutex<Value>>,
}

impl StateTrait {
    pub fn new() -> Self {
        Self {
            latest_initial: Arc::new(Mutex::new(Value::Null)),
        }
    }

    fn methods(&self) -> MethodMap {
        let latest_initial = Arc::clone(&self.latest_initial);

        MethodMap::new()
            .with("setValue", |scope, args| {
                let SetValueArgs { key, value } =
                    serde_json::from_value(args).context("setValue expects {key, value}")?;
                scope.state().set(key, value);
                Ok(Value::Null)
            })
            .with("resetValue", move |scope, args| {
                let ResetValueArgs { key } =
                    serde_json::from_value(args).context("resetValue expects {key}")?;
                let initial = latest_initial
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                scope.state().set(key, initial);
                Ok(Value::Null)
            })
    }
}

impl Default for StateTrait {
    fn default() -> Self {
        Self::new()
    }
}

impl TraitImpl for StateTrait {
    fn apply(
        &self,
        properties: &PropertyBag,
        ctx: &mut TraitContext<'_>,
    ) -> anyhow::Result<TraitOutput> {
        let StateProperties { key, initial_value } =
            serde_json::from_value(Value::Object(properties.clone()))
                .context("state trait expects {key, initialValue}")?;

        *self
            .latest_initial
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = initial_value.clone();

        let identity = ctx.identity(&key);
        ctx.init_once(&identity, |ctx| {
            ctx.subscribe_methods(self.methods());
            Ok(())
        })?;

        let lifecycle = LifecycleHooks::new()
            .on_mount(STATE_TRAIT, move |hook| {
                hook.state().set(key.clone(), initial_value.clone());
                Ok(())
            })
            .on_unmount(STATE_TRAIT, move |hook| {
                hook.release_identity(&identity);
                Ok(())
            });

        Ok(TraitOutput::empty().with_lifecycle(lifecycle))
    }
}
