//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Render the config as a commented TOML file
    pub fn to_toml(&self) -> String {
        format!(
            r#"# trellis configuration

# Trait runtime behavior
[runtime]
# Identity namespacing for one-time trait initialization:
#   "shared"    - key is the discriminator alone; equal keys on different
#                 components share one initialization slot
#   "component" - key also includes the component id
identity_scope = "{identity_scope}"
# Structurally check trait properties against their schema on every pass
validate_properties = {validate}
# Drop a component's state and methods when it unmounts
reclaim_on_unmount = {reclaim}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# File logging (in addition to stderr)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"
"#,
            identity_scope = self.runtime.identity_scope.as_str(),
            validate = self.runtime.validate_properties,
            reclaim = self.runtime.reclaim_on_unmount,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = self.logging.file_dir.display(),
            log_file_rotation = self.logging.file_rotation,
            log_file_prefix = self.logging.file_prefix,
        )
    }
}
