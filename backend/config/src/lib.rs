//! `tunebot-config`: runtime configuration for tunebot.
//!
//! Provides:
//! - Typed config schema (server, LINE channel, Azure OpenAI, conversation, logging)
//! - Environment loading with all missing variables reported at once
//! - Validation warnings/errors
//! - Redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{ConfigError, REQUIRED_VARS};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    AzureOpenAiSettings, ConversationSettings, LineSettings, LoggingSettings, ServerSettings,
    TunebotConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};

/// Load configuration from the process environment.
pub fn load() -> Result<TunebotConfig> {
    TunebotConfig::from_env().context("Failed to load configuration from environment")
}

/// Validate a loaded config, logging every warning and error.
///
/// Call after the logger is up; an error here must stop the process before
/// it serves anything.
pub fn ensure_valid(config: &TunebotConfig) -> Result<ValidationReport> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!("configuration has {} error(s)", report.errors.len());
    }
    Ok(report)
}
