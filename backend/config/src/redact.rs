//! Config redaction: produce safe-to-share config snapshots by masking sensitive fields.

use serde_json::Value;

use crate::schema::TunebotConfig;

/// Keys whose string values are secrets.
static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "channelSecret",
    "channel_secret",
    "channelAccessToken",
    "channel_access_token",
    "token",
    "secret",
    "password",
];

/// Redact a config JSON value, masking all sensitive fields.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

impl TunebotConfig {
    /// JSON snapshot of the config with secrets masked, for `check-config` and startup logs.
    pub fn redacted_summary(&self) -> Value {
        serde_json::to_value(self)
            .map(|v| redact(&v))
            .unwrap_or(Value::Null)
    }
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if is_sensitive_key(key) && !s.is_empty() {
        // Preserve length hint: show first 4 chars + ***
        let hint = if s.chars().count() > 4 {
            format!("{}***", s.chars().take(4).collect::<String>())
        } else {
            "***".to_string()
        };
        return Value::String(hint);
    }
    Value::String(s.to_string())
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

/// Collect all field paths that would be redacted (for diagnostics).
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths_recursive(value, "", &mut paths);
    paths
}

fn collect_paths_recursive(value: &Value, path: &str, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => {
            let key = path.rsplit('.').next().unwrap_or("");
            if is_sensitive_key(key) {
                out.push(path.to_string());
            }
        }
        Value::Array(arr) => {
            for (i, v) in arr.iter().enumerate() {
                collect_paths_recursive(v, &format!("{path}[{i}]"), out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                collect_paths_recursive(v, &child_path, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::tests::required_env;
    use serde_json::json;

    #[test]
    fn redacts_api_key() {
        let v = json!({ "azure": { "apiKey": "azure-api-key" } });
        let redacted = redact(&v);
        assert_eq!(redacted["azure"]["apiKey"], "azur***");
    }

    #[test]
    fn passthrough_non_sensitive() {
        let v = json!({ "logging": { "level": "debug" } });
        assert_eq!(redact(&v)["logging"]["level"], "debug");
    }

    #[test]
    fn summary_masks_every_secret() {
        let config = TunebotConfig::from_env_map(&required_env()).unwrap();
        let summary = config.redacted_summary();
        let text = summary.to_string();
        assert!(!text.contains("line-access-token"));
        assert!(!text.contains("line-channel-secret"));
        assert!(!text.contains("azure-api-key"));
        assert_eq!(summary["azure"]["model"], "gpt-4o-mini");

        let mut paths = collect_redacted_paths(&serde_json::to_value(&config).unwrap());
        paths.sort();
        assert_eq!(
            paths,
            vec!["azure.apiKey", "line.channelAccessToken", "line.channelSecret"]
        );
    }
}
