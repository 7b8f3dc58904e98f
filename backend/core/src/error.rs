use thiserror::Error;

/// Top-level error type for tunebot.
#[derive(Debug, Error)]
pub enum TuneError {
    #[error("invalid webhook signature: {0}")]
    Signature(String),

    #[error("malformed webhook payload: {0}")]
    Payload(String),

    #[error("completion provider error ({provider}): {message}")]
    Completion { provider: String, message: String },

    #[error("messaging API error: {0}")]
    Messaging(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TuneError {
    pub fn completion(provider: impl Into<String>, message: impl Into<String>) -> Self {
        TuneError::Completion {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
