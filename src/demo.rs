// Demo mode: a scripted host driving the runtime
//
// Plays the part of a render loop over a two-component page:
// - "input1" carries a `core/v1/state` trait (key "value")
// - "dropdown1" is a dropdown whose state is merged through the binding
//
// The script evaluates every component several times per tick, fires
// mount/unmount on tree changes and invokes methods in between, which
// shows exactly-once initialization and re-initialization after unmount.
//
// Run with: trellis demo --passes 5

use serde_json::{json, Value};
use trellis::bindings::{Dropdown, DropdownProps};
use trellis::config::RuntimeConfig;
use trellis::traits::STATE_TRAIT;
use trellis::{ComponentDescription, ComponentId, ComponentInstance, LifecycleHooks, Runtime, TraitDeclaration};

/// One mounted component as the host tracks it
struct Mounted {
    instance: ComponentInstance,
    hooks: LifecycleHooks,
}

/// Minimal host: evaluates, mounts and unmounts like a render loop would
struct Host {
    runtime: Runtime,
    passes: usize,
}

impl Host {
    fn new(config: RuntimeConfig, passes: usize) -> Self {
        Self {
            runtime: Runtime::new(config),
            passes: passes.max(1),
        }
    }

    /// Evaluate `passes` times, then fire mount hooks from the last pass
    fn mount(&mut self, id: &str, description: ComponentDescription) -> anyhow::Result<Mounted> {
        let instance = self.runtime.instantiate(ComponentId::new(id), description)?;
        let hooks = self.render(&instance);

        for failure in self.runtime.mount(instance.id(), &hooks) {
            tracing::warn!("{}", failure);
        }
        tracing::info!(component_id = id, "Mounted");
        Ok(Mounted { instance, hooks })
    }

    fn render(&mut self, instance: &ComponentInstance) -> LifecycleHooks {
        let mut hooks = LifecycleHooks::new();
        for pass in 0..self.passes {
            let evaluation = self.runtime.evaluate(instance);
            tracing::debug!(
                component_id = %instance.id(),
                pass,
                props = %serde_json::Value::Object(evaluation.props.clone()),
                "Evaluated"
            );
            for failure in &evaluation.failures {
                tracing::warn!("{}", failure);
            }
            hooks = evaluation.hooks;
        }
        hooks
    }

    fn unmount(&mut self, mounted: Mounted) {
        for failure in self.runtime.unmount(mounted.instance.id(), &mounted.hooks) {
            tracing::warn!("{}", failure);
        }
        tracing::info!(component_id = %mounted.instance.id(), "Unmounted");
    }

    fn print_state(&self, id: &ComponentId) {
        let state = self
            .runtime
            .state(id)
            .map(|s| Value::Object(s.clone()))
            .unwrap_or(Value::Null);
        println!("  {:<10} state = {}", id.as_str(), state);
    }
}

fn input_description(initial: &str) -> ComponentDescription {
    ComponentDescription::new("core/v1/input")
        .with_properties(json!({"placeholder": "type here"}))
        .with_trait(TraitDeclaration::new(
            STATE_TRAIT,
            json!({"key": "value", "initialValue": initial}),
        ))
}

pub fn run_demo(config: RuntimeConfig, passes: usize) -> anyhow::Result<()> {
    let mut host = Host::new(config, passes);

    println!("trellis demo ({} passes per render)", host.passes);
    println!();

    // Tick 1: both components appear
    let input = host.mount("input1", input_description("hello"))?;
    let input_id = input.instance.id().clone();
    let identity = host.runtime.identity_key(&input_id, "value");

    let dropdown_mount = host.mount(
        "dropdown1",
        ComponentDescription::new("arco/v1/dropdown").with_properties(DropdownProps::example().to_value()),
    )?;
    let mut dropdown = Dropdown::new(dropdown_mount.instance.id().clone(), DropdownProps::default());
    let evaluation = host.runtime.evaluate(&dropdown_mount.instance);
    dropdown.update_props(&evaluation.props)?;

    println!("after mount:");
    println!(
        "  {:<10} items = {:?}",
        dropdown.id().as_str(),
        dropdown.items().iter().map(|item| item.label.as_str()).collect::<Vec<_>>()
    );
    host.print_state(&input_id);
    println!(
        "  {:<10} methods = {:?}",
        input_id.as_str(),
        host.runtime.methods_of(&input_id)
    );
    println!("  initialized slots = {}", host.runtime.initialized_count());

    // Tick 2: user interaction between passes
    host.runtime
        .invoke(&input_id, "setValue", json!({"key": "value", "value": "edited"}))?;
    host.runtime
        .invoke(&input_id, "setValue", json!({"key": "draft", "value": true}))?;
    host.render(&input.instance);

    let pressed = dropdown.button_click();
    let opened = dropdown.visible_change(&mut host.runtime, true);
    let choice = dropdown
        .items()
        .get(1)
        .map(|item| item.key.clone())
        .unwrap_or_default();
    let clicked = dropdown.click_menu_item(&mut host.runtime, &choice);
    tracing::info!(
        events = ?[pressed.name(), opened.name(), clicked.name()],
        "Dropdown events dispatched"
    );

    println!();
    println!("after setValue and dropdown clicks:");
    host.print_state(&input_id);
    host.print_state(dropdown.id());

    host.runtime.invoke(&input_id, "resetValue", json!({"key": "value"}))?;
    println!();
    println!("after resetValue:");
    host.print_state(&input_id);

    if let Err(e) = host.runtime.invoke(&input_id, "unknownMethod", json!({})) {
        println!("  invoke unknownMethod -> {}", e);
    }

    // Tick 3: the input leaves the tree and comes back
    host.unmount(input);
    println!();
    println!(
        "after unmount: slot {} initialized = {}",
        identity,
        host.runtime.has_initialized(&identity)
    );

    let input = host.mount("input1", input_description("again"))?;
    println!(
        "after remount: slot {} initialized = {}",
        identity,
        host.runtime.has_initialized(&identity)
    );
    host.print_state(&input_id);

    host.unmount(input);
    host.unmount(dropdown_mount);
    Ok(())
}
