//! Headless presentation bindings
//!
//! Renderers built on the runtime's public contract only: they read merged
//! state, merge partial state and invoke methods through [`Runtime`]. They
//! never see the identity tracker or the method registry.
//!
//! [`Runtime`]: crate::runtime::Runtime

mod dropdown;
mod record_editor;

pub use dropdown::{Dropdown, DropdownEvent, DropdownProps, DropdownState, DropdownType, MenuItem};
pub use record_editor::{RecordEditor, RecordEditorError, RecordEditorOptions, Row};
