//! Environment variable loading.
//!
//! Required variables must be set and non-empty; every missing one is
//! reported in a single error so the operator can fix them in one pass.

use std::collections::HashMap;
use std::str::FromStr;

use crate::defaults::*;
use crate::schema::{
    AzureOpenAiSettings, ConversationSettings, LineSettings, LoggingSettings, ServerSettings,
    TunebotConfig,
};

/// Variables without which the process must not start.
pub const REQUIRED_VARS: &[&str] = &[
    "LINE_CHANNEL_ACCESS_TOKEN",
    "LINE_CHANNEL_SECRET",
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_API_VERSION",
    "AZURE_OPENAI_MODEL",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required env var(s): {}", .0.join(", "))]
    MissingVars(Vec<String>),

    #[error("Invalid value {value:?} for env var \"{var}\": {reason}")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },
}

impl TunebotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(&std::env::vars().collect())
    }

    /// Load configuration from a provided map (useful for testing).
    pub fn from_env_map(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| env.get(name).filter(|v| !v.trim().is_empty()).cloned();

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|name| lookup(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }
        let required = |name: &str| lookup(name).unwrap_or_default();

        let history_max_turns = match parse_or(env, "HISTORY_MAX_TURNS", DEFAULT_HISTORY_MAX_TURNS)? {
            0 => None,
            n => Some(n),
        };

        Ok(Self {
            server: ServerSettings {
                bind: lookup("TUNEBOT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
                port: parse_or(env, "TUNEBOT_PORT", DEFAULT_PORT)?,
                webhook_path: lookup("TUNEBOT_WEBHOOK_PATH")
                    .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string()),
            },
            line: LineSettings {
                channel_access_token: required("LINE_CHANNEL_ACCESS_TOKEN"),
                channel_secret: required("LINE_CHANNEL_SECRET"),
                api_base_url: lookup("LINE_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_LINE_API_BASE_URL.to_string()),
            },
            azure: AzureOpenAiSettings {
                endpoint: required("AZURE_OPENAI_ENDPOINT"),
                api_key: required("AZURE_OPENAI_API_KEY"),
                api_version: required("AZURE_OPENAI_API_VERSION"),
                model: required("AZURE_OPENAI_MODEL"),
                timeout_secs: parse_or(
                    env,
                    "COMPLETION_TIMEOUT_SECS",
                    DEFAULT_COMPLETION_TIMEOUT_SECS,
                )?,
            },
            conversation: ConversationSettings {
                history_max_turns,
                reset_commands_enabled: parse_bool_or(env, "RESET_COMMANDS_ENABLED", false)?,
            },
            logging: LoggingSettings {
                level: lookup("TUNEBOT_LOG_LEVEL")
                    .or_else(|| lookup("RUST_LOG"))
                    .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
                dir: lookup("TUNEBOT_LOG_DIR"),
                json: parse_bool_or(env, "TUNEBOT_LOG_JSON", false)?,
            },
        })
    }
}

fn parse_or<T>(env: &HashMap<String, String>, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.get(var).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: var.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn parse_bool_or(
    env: &HashMap<String, String>,
    var: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match env.get(var).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(raw) => match raw.as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var: var.to_string(),
                value: raw,
                reason: "expected true/false".to_string(),
            }),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    pub(crate) fn required_env() -> HashMap<String, String> {
        env(&[
            ("LINE_CHANNEL_ACCESS_TOKEN", "line-access-token"),
            ("LINE_CHANNEL_SECRET", "line-channel-secret"),
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "azure-api-key"),
            ("AZURE_OPENAI_API_VERSION", "2024-02-01"),
            ("AZURE_OPENAI_MODEL", "gpt-4o-mini"),
        ])
    }

    #[test]
    fn loads_required_with_defaults() {
        let config = TunebotConfig::from_env_map(&required_env()).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.webhook_path, "/callback");
        assert_eq!(config.line.api_base_url, "https://api.line.me");
        assert_eq!(config.azure.model, "gpt-4o-mini");
        assert_eq!(config.azure.timeout_secs, 30);
        assert_eq!(config.conversation.history_max_turns, Some(10));
        assert!(!config.conversation.reset_commands_enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn reports_every_missing_var() {
        let mut vars = required_env();
        vars.remove("LINE_CHANNEL_SECRET");
        vars.insert("AZURE_OPENAI_MODEL".into(), "   ".into());

        let err = TunebotConfig::from_env_map(&vars).unwrap_err();
        match err {
            ConfigError::MissingVars(missing) => {
                assert_eq!(missing, vec!["LINE_CHANNEL_SECRET", "AZURE_OPENAI_MODEL"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_env_is_missing_everything() {
        let err = TunebotConfig::from_env_map(&HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("LINE_CHANNEL_ACCESS_TOKEN"));
        assert!(err.to_string().contains("AZURE_OPENAI_API_VERSION"));
    }

    #[test]
    fn zero_history_turns_means_unbounded() {
        let mut vars = required_env();
        vars.insert("HISTORY_MAX_TURNS".into(), "0".into());
        let config = TunebotConfig::from_env_map(&vars).unwrap();
        assert_eq!(config.conversation.history_max_turns, None);
    }

    #[test]
    fn invalid_port_is_error() {
        let mut vars = required_env();
        vars.insert("TUNEBOT_PORT".into(), "eighty".into());
        let err = TunebotConfig::from_env_map(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TUNEBOT_PORT"));
    }

    #[test]
    fn parses_boolean_flags() {
        let mut vars = required_env();
        vars.insert("RESET_COMMANDS_ENABLED".into(), "TRUE".into());
        vars.insert("TUNEBOT_LOG_JSON".into(), "1".into());
        let config = TunebotConfig::from_env_map(&vars).unwrap();
        assert!(config.conversation.reset_commands_enabled);
        assert!(config.logging.json);

        vars.insert("RESET_COMMANDS_ENABLED".into(), "maybe".into());
        assert!(TunebotConfig::from_env_map(&vars).is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = TunebotConfig::from_env_map(&required_env()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("line-channel-secret"));
        assert!(!debug.contains("azure-api-key"));
        assert!(debug.contains("gpt-4o-mini"));
    }
}
