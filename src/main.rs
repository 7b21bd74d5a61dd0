// Trellis - host binary for the trait composition runtime
//
// The library does the work; this binary wires configuration and logging
// around it and offers a few tooling commands.
//
// Architecture:
// - Config: ~/.config/trellis/config.toml, overridden by TRELLIS_* env vars
// - Logging (tracing): stderr plus optional rolling JSON files
// - Demo: scripted host session exercising mount, passes, methods, unmount

mod cli;
mod demo;
mod logging;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use trellis::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tooling commands run before logging so their stdout stays clean
    match cli.command {
        Some(Commands::Traits) => return cli::handle_traits(),
        Some(Commands::Config { show, reset, path }) => {
            return cli::handle_config(show, reset, path)
        }
        _ => {}
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = Config::from_env()?;

    // Keep the guard alive until exit so file logs flush
    let _file_guard = logging::init(&config.logging);

    tracing::debug!(
        identity_scope = config.runtime.identity_scope.as_str(),
        validate_properties = config.runtime.validate_properties,
        reclaim_on_unmount = config.runtime.reclaim_on_unmount,
        "Configuration loaded"
    );

    let passes = match cli.command {
        Some(Commands::Demo { passes }) => passes,
        _ => 3,
    };
    demo::run_demo(config.runtime, passes)
}
