//! CLI `check-config` command
//!
//! Loads configuration the same way `serve` does and reports every problem
//! without starting the server.

use anyhow::{bail, Result};

use tunebot_config::{validate, ConfigError, TunebotConfig, REQUIRED_VARS};

/// Runs the check. Errors when the server would refuse to start.
pub fn run() -> Result<()> {
    println!("\n🔍 Checking tunebot configuration...\n");

    let config = match TunebotConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingVars(missing)) => {
            println!("Required environment variables:");
            for var in REQUIRED_VARS {
                if missing.iter().any(|m| m == var) {
                    println!("  🔴 {} is missing", var);
                } else {
                    println!("  🟢 {} is set", var);
                }
            }
            println!();
            bail!("{} required variable(s) missing", missing.len());
        }
        Err(e) => {
            println!("  🔴 {}", e);
            bail!("configuration could not be loaded");
        }
    };

    let report = validate(&config);
    for warning in &report.warnings {
        println!("  🟡 {}: {}", warning.path, warning.message);
    }
    for error in &report.errors {
        println!("  🔴 {}: {}", error.path, error.message);
    }

    println!("\nEffective configuration:");
    println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
    println!();

    if !report.is_valid() {
        bail!("configuration has {} error(s)", report.errors.len());
    }
    println!("✅ Configuration is valid.");
    Ok(())
}
