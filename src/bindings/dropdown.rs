//! Dropdown selector binding
//!
//! Keeps `{selectedItemKey, visible}` in the component's state and reports
//! which host event each interaction dispatches.

use crate::component::{ComponentId, PropertyBag};
use crate::runtime::Runtime;
use crate::schema::{Field, Schema};
use crate::state::StateMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Events a dropdown dispatches to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownEvent {
    ClickMenuItem,
    VisibleChange,
    ButtonClick,
}

impl DropdownEvent {
    /// Event name as wired in the component description
    pub fn name(&self) -> &'static str {
        match self {
            DropdownEvent::ClickMenuItem => "onClickMenuItem",
            DropdownEvent::VisibleChange => "onVisibleChange",
            DropdownEvent::ButtonClick => "onButtonClick",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropdownType {
    #[default]
    Default,
    Button,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub key: String,
    pub label: String,
}

impl MenuItem {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Dropdown component properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DropdownProps {
    pub dropdown_type: DropdownType,
    pub trigger: String,
    pub position: String,
    pub disabled: bool,
    pub default_popup_visible: bool,
    pub list: Vec<MenuItem>,
    pub auto_align_popup_width: bool,
    pub unmount_on_exit: bool,
}

impl Default for DropdownProps {
    fn default() -> Self {
        Self {
            dropdown_type: DropdownType::Default,
            trigger: "click".to_string(),
            position: "bl".to_string(),
            disabled: false,
            default_popup_visible: false,
            list: Vec::new(),
            auto_align_popup_width: true,
            unmount_on_exit: false,
        }
    }
}

impl DropdownProps {
    /// Properties used when a dropdown is dropped into a page
    pub fn example() -> Self {
        Self {
            list: vec![
                MenuItem::new("1", "smartx"),
                MenuItem::new("2", "baidu"),
                MenuItem::new("3", "tencent"),
            ],
            ..Self::default()
        }
    }

    pub fn from_props(props: &PropertyBag) -> anyhow::Result<Self> {
        Ok(serde_json::from_value(Value::Object(props.clone()))?)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// State the dropdown contributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DropdownState {
    pub selected_item_key: String,
    pub visible: bool,
}

impl DropdownState {
    pub fn schema() -> Schema {
        Schema::object(vec![
            Field::required("selectedItemKey", Schema::String),
            Field::required("visible", Schema::Boolean),
        ])
    }
}

/// Binds one dropdown component to the runtime
#[derive(Debug, Clone)]
pub struct Dropdown {
    id: ComponentId,
    props: DropdownProps,
}

impl Dropdown {
    pub fn new(id: ComponentId, props: DropdownProps) -> Self {
        Self { id, props }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    /// Re-read properties after an evaluation pass
    pub fn update_props(&mut self, props: &PropertyBag) -> anyhow::Result<()> {
        self.props = DropdownProps::from_props(props)?;
        Ok(())
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.props.list
    }

    /// Current state, with missing fields at their defaults
    pub fn state(&self, runtime: &Runtime) -> DropdownState {
        runtime
            .state(&self.id)
            .and_then(|state| serde_json::from_value(Value::Object(state.clone())).ok())
            .unwrap_or_default()
    }

    pub fn click_menu_item(&self, runtime: &mut Runtime, key: &str) -> DropdownEvent {
        runtime.merge_state(&self.id, partial(json!({ "selectedItemKey": key })));
        DropdownEvent::ClickMenuItem
    }

    pub fn visible_change(&self, runtime: &mut Runtime, visible: bool) -> DropdownEvent {
        runtime.merge_state(&self.id, partial(json!({ "visible": visible })));
        DropdownEvent::VisibleChange
    }

    /// Button clicks leave state alone
    pub fn button_click(&self) -> DropdownEvent {
        DropdownEvent::ButtonClick
    }
}

fn partial(value: Value) -> StateMap {
    match value {
        Value::Object(map) => map,
        _ => StateMap::new(),
    }
}
