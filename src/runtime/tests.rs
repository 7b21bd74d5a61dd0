//! Runtime tests
//!
//! These drive the runtime the way a host does: instantiate once, evaluate
//! on every pass, fire mount/unmount at tree changes, invoke in between.

use super::*;
use crate::component::TraitDeclaration;
use crate::identity::IdentityScope;
use crate::pipeline::{TraitContext, TraitFailure, TraitImpl, TraitOutput};
use crate::schema::{Schema, TraitSpec};
use crate::traits::{FnTraitFactory, STATE_TRAIT};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn state_component(key: &str, initial: Value) -> ComponentDescription {
    ComponentDescription::new("core/v1/text").with_trait(TraitDeclaration::new(
        STATE_TRAIT,
        json!({"key": key, "initialValue": initial}),
    ))
}

fn test_spec(name: &str) -> TraitSpec {
    TraitSpec {
        version: "test/v1".to_string(),
        name: name.to_string(),
        description: String::new(),
        properties: Schema::Any,
        state: Schema::Any,
        methods: Vec::new(),
    }
}

/// Patches with its `patch` property
struct PatchTrait;

impl TraitImpl for PatchTrait {
    fn apply(
        &self,
        properties: &PropertyBag,
        _ctx: &mut TraitContext<'_>,
    ) -> anyhow::Result<TraitOutput> {
        Ok(TraitOutput::patch(
            properties.get("patch").cloned().unwrap_or(Value::Null),
        ))
    }
}

/// Always fails
struct BrokenTrait;

impl TraitImpl for BrokenTrait {
    fn apply(
        &self,
        _properties: &PropertyBag,
        _ctx: &mut TraitContext<'_>,
    ) -> anyhow::Result<TraitOutput> {
        anyhow::bail!("broken on purpose")
    }
}

/// Counts how often its one-time branch runs
struct CountingTrait {
    inits: Arc<AtomicUsize>,
}

impl TraitImpl for CountingTrait {
    fn apply(
        &self,
        _properties: &PropertyBag,
        ctx: &mut TraitContext<'_>,
    ) -> anyhow::Result<TraitOutput> {
        let identity = ctx.identity("counter");
        ctx.init_once(&identity, |_| {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })?;
        Ok(TraitOutput::empty())
    }
}

fn test_runtime(config: RuntimeConfig) -> Runtime {
    let mut registry = TraitRegistry::with_builtins();
    registry
        .register(FnTraitFactory::new(test_spec("patch"), || Box::new(PatchTrait)))
        .unwrap();
    registry
        .register(FnTraitFactory::new(test_spec("broken"), || Box::new(BrokenTrait)))
        .unwrap();
    Runtime::with_registry(config, registry)
}

// ─────────────────────────────────────────────────────────────────────────────
// Exactly-once initialization
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_repeated_passes_initialize_once() {
    let inits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&inits);

    let mut registry = TraitRegistry::new();
    registry
        .register(FnTraitFactory::new(test_spec("counting"), move || {
            Box::new(CountingTrait {
                inits: Arc::clone(&counter),
            })
        }))
        .unwrap();
    let mut runtime = Runtime::with_registry(RuntimeConfig::default(), registry);

    let id = ComponentId::new("c1");
    let description = ComponentDescription::new("core/v1/text")
        .with_trait(TraitDeclaration::new("test/v1/counting", json!({})));
    let instance = runtime.instantiate(id, description).unwrap();

    for _ in 0..10 {
        assert!(runtime.evaluate(&instance).is_clean());
    }
    assert_eq!(inits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_state_trait_subscribes_once_and_seeds_on_mount() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let instance = runtime
        .instantiate(id.clone(), state_component("value", json!("initial")))
        .unwrap();

    let evaluation = runtime.evaluate(&instance);
    // Nothing is seeded before mount
    assert_eq!(runtime.read_state(&id, "value"), None);
    assert!(runtime.mount(&id, &evaluation.hooks).is_empty());
    assert_eq!(runtime.read_state(&id, "value"), Some(&json!("initial")));

    runtime.invoke(&id, "setValue", json!({"key": "value", "value": "edited"})).unwrap();

    // Further passes neither re-seed nor re-subscribe
    for _ in 0..5 {
        runtime.evaluate(&instance);
    }
    assert_eq!(runtime.read_state(&id, "value"), Some(&json!("edited")));
    assert_eq!(runtime.methods_of(&id), vec!["resetValue", "setValue"]);
    assert_eq!(runtime.initialized_count(), 1);
}

#[test]
fn test_remount_reinitializes() {
    let config = RuntimeConfig {
        reclaim_on_unmount: true,
        ..RuntimeConfig::default()
    };
    let mut runtime = Runtime::new(config);
    let id = ComponentId::new("c1");
    let instance = runtime
        .instantiate(id.clone(), state_component("value", json!(0)))
        .unwrap();
    let key = runtime.identity_key(&id, "value");

    let hooks = runtime.evaluate(&instance).hooks;
    runtime.mount(&id, &hooks);
    runtime.invoke(&id, "setValue", json!({"key": "value", "value": 7})).unwrap();
    assert!(runtime.has_initialized(&key));

    runtime.unmount(&id, &hooks);
    assert!(!runtime.has_initialized(&key));
    assert!(runtime.methods_of(&id).is_empty());

    // The next pass subscribes again
    let hooks = runtime.evaluate(&instance).hooks;
    assert!(runtime.has_initialized(&key));
    assert_eq!(runtime.methods_of(&id), vec!["resetValue", "setValue"]);

    runtime.mount(&id, &hooks);
    assert_eq!(runtime.read_state(&id, "value"), Some(&json!(0)));
}

#[test]
fn test_remount_reruns_one_time_branch() {
    let inits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&inits);

    let mut registry = TraitRegistry::new();
    registry
        .register(FnTraitFactory::new(test_spec("counting"), move || {
            Box::new(CountingTrait {
                inits: Arc::clone(&counter),
            })
        }))
        .unwrap();
    let mut runtime = Runtime::with_registry(RuntimeConfig::default(), registry);

    let id = ComponentId::new("c1");
    let description = ComponentDescription::new("core/v1/text")
        .with_trait(TraitDeclaration::new("test/v1/counting", json!({})));
    let instance = runtime.instantiate(id.clone(), description).unwrap();

    let mut hooks = LifecycleHooks::new();
    for _ in 0..3 {
        hooks = runtime.evaluate(&instance).hooks;
    }
    runtime.mount(&id, &hooks);
    assert_eq!(inits.load(Ordering::SeqCst), 1);

    runtime.unmount(&id, &hooks);
    for _ in 0..3 {
        runtime.evaluate(&instance);
    }
    assert_eq!(inits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_repeated_mount_hooks_settle_on_initial_value() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let instance = runtime
        .instantiate(id.clone(), state_component("value", json!("seed")))
        .unwrap();
    let hooks = runtime.evaluate(&instance).hooks;

    runtime.mount(&id, &hooks);
    runtime.mount(&id, &hooks);
    assert_eq!(runtime.read_state(&id, "value"), Some(&json!("seed")));

    runtime.invoke(&id, "setValue", json!({"key": "value", "value": "edited"})).unwrap();
    assert!(runtime.mount(&id, &hooks).is_empty());
    assert_eq!(
        Value::Object(runtime.state(&id).cloned().unwrap()),
        json!({"value": "seed"})
    );
}

#[test]
fn test_discriminator_change_while_mounted() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let mut instance = runtime
        .instantiate(id.clone(), state_component("a", json!(1)))
        .unwrap();
    let old_key = runtime.identity_key(&id, "a");
    let new_key = runtime.identity_key(&id, "b");

    let hooks = runtime.evaluate(&instance).hooks;
    runtime.mount(&id, &hooks);

    instance
        .reconfigure(0, json!({"key": "b", "initialValue": 2}))
        .unwrap();
    let hooks = runtime.evaluate(&instance).hooks;

    // The new key initializes on the next pass; the old one stays marked
    assert!(runtime.has_initialized(&old_key));
    assert!(runtime.has_initialized(&new_key));
    assert_eq!(runtime.initialized_count(), 2);

    // Mount hooks seed under the current key only
    runtime.mount(&id, &hooks);
    assert_eq!(
        Value::Object(runtime.state(&id).cloned().unwrap()),
        json!({"a": 1, "b": 2})
    );

    // Unmount releases both slots the component marked
    runtime.unmount(&id, &hooks);
    assert!(!runtime.has_initialized(&old_key));
    assert!(!runtime.has_initialized(&new_key));
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity collision
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_shared_discriminator_collides_across_components() {
    let mut runtime = Runtime::default();
    let first = ComponentId::new("first");
    let second = ComponentId::new("second");

    let a = runtime
        .instantiate(first.clone(), state_component("value", json!(1)))
        .unwrap();
    let b = runtime
        .instantiate(second.clone(), state_component("value", json!(2)))
        .unwrap();

    assert_eq!(
        runtime.identity_key(&first, "value"),
        runtime.identity_key(&second, "value")
    );

    let hooks_a = runtime.evaluate(&a).hooks;
    runtime.mount(&first, &hooks_a);
    let hooks_b = runtime.evaluate(&b).hooks;
    runtime.mount(&second, &hooks_b);

    // Only the first component subscribed; the second skipped initialization
    assert_eq!(runtime.methods_of(&first), vec!["resetValue", "setValue"]);
    assert!(runtime.methods_of(&second).is_empty());
    assert!(matches!(
        runtime.invoke(&second, "setValue", json!({"key": "value", "value": 3})),
        Err(MethodError::NotFound { .. })
    ));
    assert_eq!(runtime.initialized_count(), 1);

    // Mount hooks are not gated, so both components are still seeded
    assert_eq!(runtime.read_state(&second, "value"), Some(&json!(2)));
}

#[test]
fn test_component_scope_avoids_collision() {
    let config = RuntimeConfig::default().with_identity_scope(IdentityScope::Component);
    let mut runtime = Runtime::new(config);
    let first = ComponentId::new("first");
    let second = ComponentId::new("second");

    let a = runtime
        .instantiate(first.clone(), state_component("value", json!(1)))
        .unwrap();
    let b = runtime
        .instantiate(second.clone(), state_component("value", json!(2)))
        .unwrap();
    runtime.evaluate(&a);
    runtime.evaluate(&b);

    assert_ne!(
        runtime.identity_key(&first, "value"),
        runtime.identity_key(&second, "value")
    );
    assert_eq!(runtime.methods_of(&second), vec!["resetValue", "setValue"]);
    assert_eq!(runtime.initialized_count(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Methods
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_set_and_reset_merge_keys() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let instance = runtime
        .instantiate(id.clone(), state_component("a", json!(0)))
        .unwrap();
    let hooks = runtime.evaluate(&instance).hooks;
    runtime.mount(&id, &hooks);

    runtime.invoke(&id, "setValue", json!({"key": "a", "value": 1})).unwrap();
    runtime.invoke(&id, "setValue", json!({"key": "b", "value": 2})).unwrap();
    assert_eq!(
        Value::Object(runtime.state(&id).cloned().unwrap()),
        json!({"a": 1, "b": 2})
    );

    runtime.invoke(&id, "resetValue", json!({"key": "a"})).unwrap();
    assert_eq!(
        Value::Object(runtime.state(&id).cloned().unwrap()),
        json!({"a": 0, "b": 2})
    );
}

#[test]
fn test_reset_uses_latest_initial_value() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let mut instance = runtime
        .instantiate(id.clone(), state_component("a", json!("first")))
        .unwrap();
    let hooks = runtime.evaluate(&instance).hooks;
    runtime.mount(&id, &hooks);

    instance
        .reconfigure(0, json!({"key": "a", "initialValue": "second"}))
        .unwrap();
    runtime.evaluate(&instance);

    runtime.invoke(&id, "setValue", json!({"key": "a", "value": "edited"})).unwrap();
    runtime.invoke(&id, "resetValue", json!({"key": "a"})).unwrap();
    assert_eq!(runtime.read_state(&id, "a"), Some(&json!("second")));
}

#[test]
fn test_unknown_method_is_not_found() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let instance = runtime
        .instantiate(id.clone(), state_component("a", json!(0)))
        .unwrap();
    runtime.evaluate(&instance);

    let result = runtime.invoke(&id, "unknownMethod", json!({}));
    match result {
        Err(MethodError::NotFound { component_id, name }) => {
            assert_eq!(component_id, id);
            assert_eq!(name, "unknownMethod");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_bad_method_args_are_handler_errors() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let instance = runtime
        .instantiate(id.clone(), state_component("a", json!(0)))
        .unwrap();
    runtime.evaluate(&instance);

    let result = runtime.invoke(&id, "setValue", json!("not an object"));
    assert!(matches!(result, Err(MethodError::Handler { .. })));
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline behavior through the facade
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_props_patch_follows_declaration_order() {
    let mut runtime = test_runtime(RuntimeConfig::default());
    let id = ComponentId::new("c1");
    let description = ComponentDescription::new("core/v1/text")
        .with_properties(json!({"x": 0, "label": "base"}))
        .with_trait(TraitDeclaration::new("test/v1/patch", json!({"patch": {"x": 1}})))
        .with_trait(TraitDeclaration::new("test/v1/patch", json!({"patch": {"x": 2}})));
    let instance = runtime.instantiate(id, description).unwrap();

    let evaluation = runtime.evaluate(&instance);
    assert_eq!(evaluation.props["x"], json!(2));
    assert_eq!(evaluation.props["label"], json!("base"));
}

#[test]
fn test_failing_trait_is_isolated() {
    let mut runtime = test_runtime(RuntimeConfig::default());
    let id = ComponentId::new("c1");
    let description = ComponentDescription::new("core/v1/text")
        .with_trait(TraitDeclaration::new("test/v1/broken", json!({})))
        .with_trait(TraitDeclaration::new("test/v1/patch", json!({"patch": {"ok": true}})));
    let instance = runtime.instantiate(id.clone(), description).unwrap();

    let evaluation = runtime.evaluate(&instance);
    assert_eq!(evaluation.props["ok"], json!(true));
    assert_eq!(evaluation.failures.len(), 1);
    assert_eq!(evaluation.failures[0].component_id, id);
    assert_eq!(evaluation.failures[0].trait_type, "test/v1/broken");
}

#[test]
fn test_invalid_state_properties_skip_the_trait() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let description = ComponentDescription::new("core/v1/text")
        .with_trait(TraitDeclaration::new(STATE_TRAIT, json!({"initialValue": 1})));
    let instance = runtime.instantiate(id.clone(), description).unwrap();

    let evaluation = runtime.evaluate(&instance);
    assert!(matches!(
        evaluation.failures[0].failure,
        TraitFailure::InvalidProperties(_)
    ));
    assert!(evaluation.hooks.is_empty());
    assert!(runtime.methods_of(&id).is_empty());
}

#[test]
fn test_unknown_trait_type_fails_instantiation() {
    let runtime = Runtime::default();
    let description = ComponentDescription::new("core/v1/text")
        .with_trait(TraitDeclaration::new("nope/v1/missing", json!({})));

    let result = runtime.instantiate(ComponentId::new("c1"), description);
    assert!(matches!(
        result,
        Err(RuntimeError::UnknownTraitType { ref trait_type, .. }) if trait_type == "nope/v1/missing"
    ));
}

#[test]
fn test_reconfigure_out_of_range() {
    let runtime = Runtime::default();
    let mut instance = runtime
        .instantiate(ComponentId::new("c1"), state_component("a", json!(0)))
        .unwrap();

    let result = instance.reconfigure(3, json!({"key": "b"}));
    assert!(matches!(result, Err(RuntimeError::NoSuchTrait { index: 3, .. })));
}

// ─────────────────────────────────────────────────────────────────────────────
// Unmount
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unmount_releases_identity_despite_failing_hook() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let instance = runtime
        .instantiate(id.clone(), state_component("a", json!(0)))
        .unwrap();
    let key = runtime.identity_key(&id, "a");

    // A hook that fails ahead of the state trait's release
    let mut hooks = LifecycleHooks::new()
        .on_unmount("test/v1/flaky", |_| Err(anyhow::anyhow!("flaky teardown")));
    hooks.extend(runtime.evaluate(&instance).hooks);
    runtime.mount(&id, &hooks);

    let failures = runtime.unmount(&id, &hooks);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].trait_type, "test/v1/flaky");
    assert!(!runtime.has_initialized(&key));
}

#[test]
fn test_unmount_after_failed_pass_releases_identity() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let mut instance = runtime
        .instantiate(id.clone(), state_component("a", json!(0)))
        .unwrap();
    let key = runtime.identity_key(&id, "a");

    let hooks = runtime.evaluate(&instance).hooks;
    runtime.mount(&id, &hooks);

    // A non-string key fails validation, so this pass yields no unmount hook
    instance.reconfigure(0, json!({"key": 5})).unwrap();
    let evaluation = runtime.evaluate(&instance);
    assert_eq!(evaluation.failures.len(), 1);
    assert!(evaluation.hooks.on_unmount.is_empty());

    runtime.unmount(&id, &evaluation.hooks);
    assert!(!runtime.has_initialized(&key));

    // A fresh component under the same discriminator initializes normally
    let fresh_id = ComponentId::new("c2");
    let fresh = runtime
        .instantiate(fresh_id.clone(), state_component("a", json!(0)))
        .unwrap();
    runtime.evaluate(&fresh);
    assert_eq!(runtime.methods_of(&fresh_id), vec!["resetValue", "setValue"]);
}

#[test]
fn test_unmount_leaves_slots_of_other_components() {
    let mut runtime = Runtime::default();
    let first = ComponentId::new("first");
    let second = ComponentId::new("second");

    let a = runtime
        .instantiate(first.clone(), state_component("x", json!(0)))
        .unwrap();
    let b = runtime
        .instantiate(second.clone(), state_component("y", json!(0)))
        .unwrap();
    runtime.evaluate(&a);
    runtime.evaluate(&b);

    runtime.unmount(&first, &LifecycleHooks::new());
    assert!(!runtime.has_initialized(&runtime.identity_key(&first, "x")));
    assert!(runtime.has_initialized(&runtime.identity_key(&second, "y")));
}

#[test]
fn test_unmount_keeps_state_by_default() {
    let mut runtime = Runtime::default();
    let id = ComponentId::new("c1");
    let instance = runtime
        .instantiate(id.clone(), state_component("a", json!(5)))
        .unwrap();
    let hooks = runtime.evaluate(&instance).hooks;
    runtime.mount(&id, &hooks);
    runtime.unmount(&id, &hooks);

    assert_eq!(runtime.read_state(&id, "a"), Some(&json!(5)));
    assert!(!runtime.methods_of(&id).is_empty());
}

#[test]
fn test_reclaim_on_unmount_drops_state_and_methods() {
    let config = RuntimeConfig {
        reclaim_on_unmount: true,
        ..RuntimeConfig::default()
    };
    let mut runtime = Runtime::new(config);
    let id = ComponentId::new("c1");
    let instance = runtime
        .instantiate(id.clone(), state_component("a", json!(5)))
        .unwrap();
    let hooks = runtime.evaluate(&instance).hooks;
    runtime.mount(&id, &hooks);
    runtime.unmount(&id, &hooks);

    assert!(runtime.state(&id).is_none());
    assert!(runtime.methods_of(&id).is_empty());
}

#[test]
fn test_runtimes_do_not_share_identities() {
    let mut one = Runtime::default();
    let mut two = Runtime::default();
    let id = ComponentId::new("c1");

    let a = one.instantiate(id.clone(), state_component("a", json!(0))).unwrap();
    let b = two.instantiate(id.clone(), state_component("a", json!(0))).unwrap();
    one.evaluate(&a);
    two.evaluate(&b);

    assert_eq!(one.methods_of(&id), vec!["resetValue", "setValue"]);
    assert_eq!(two.methods_of(&id), vec!["resetValue", "setValue"]);
}
