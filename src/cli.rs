// CLI module - command-line argument parsing and handlers
//
// Subcommands:
// - demo: Run a scripted host session against the runtime
// - traits: Print the registered trait specs as JSON
// - config --show | --path | --reset: Configuration management

use clap::{Parser, Subcommand};
use std::io::Write;
use trellis::config::{Config, VERSION};
use trellis::TraitRegistry;

/// Trellis - trait composition runtime for declarative components
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version = VERSION)]
#[command(about = "Trait composition runtime for declarative components", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scripted host session (default)
    Demo {
        /// Number of evaluation passes per mounted component
        #[arg(long, default_value_t = 3)]
        passes: usize,
    },

    /// Print registered trait specs as JSON
    Traits,

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

pub fn handle_traits() -> anyhow::Result<()> {
    let registry = TraitRegistry::with_builtins();
    let specs = registry.specs();
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}

pub fn handle_config(show: bool, reset: bool, path: bool) -> anyhow::Result<()> {
    if path {
        handle_config_path()
    } else if show {
        handle_config_show()
    } else if reset {
        handle_config_reset()
    } else {
        // No flag provided, show help
        println!("Usage: trellis config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
        Ok(())
    }
}

fn handle_config_path() -> anyhow::Result<()> {
    let path = Config::config_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
    println!("{}", path.display());
    Ok(())
}

fn handle_config_show() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    // Show source info
    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
    Ok(())
}

fn handle_config_reset() -> anyhow::Result<()> {
    let path = Config::config_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Write the default config (using Config's single source of truth)
    std::fs::write(&path, Config::default().to_toml())?;

    println!("Config reset to defaults: {}", path.display());
    Ok(())
}
