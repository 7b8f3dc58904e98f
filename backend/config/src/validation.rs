//! Config validation: checks beyond "is it set", with user-friendly messages.

use crate::schema::TunebotConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &TunebotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_endpoints(config, &mut report);
    validate_conversation(config, &mut report);
    report
}

fn validate_server(config: &TunebotConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.port < 1024 && server.port != 80 && server.port != 443 {
        report.warn(
            "server.port",
            format!(
                "Port {} requires elevated privileges; consider using a port >= 1024",
                server.port
            ),
        );
    }
    if !server.webhook_path.starts_with('/') {
        report.error("server.webhookPath", "Webhook path must start with '/'");
    }
}

fn validate_endpoints(config: &TunebotConfig, report: &mut ValidationReport) {
    for (path, url) in [
        ("azure.endpoint", &config.azure.endpoint),
        ("line.apiBaseUrl", &config.line.api_base_url),
    ] {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            report.error(path, format!("'{url}' is not an http(s) URL"));
        } else if url.starts_with("http://") {
            report.warn(path, "Credentials will be sent over plain HTTP");
        }
    }
    if config.azure.timeout_secs == 0 {
        report.error("azure.timeoutSecs", "Completion timeout must be > 0");
    }
}

fn validate_conversation(config: &TunebotConfig, report: &mut ValidationReport) {
    if config.conversation.history_max_turns.is_none() {
        report.warn(
            "conversation.historyMaxTurns",
            "History is unbounded; prompt size grows with every turn",
        );
    }
}
