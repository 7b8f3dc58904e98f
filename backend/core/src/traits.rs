use anyhow::Result;
use async_trait::async_trait;

use crate::types::ChatMessage;

/// Trait for hosted chat-completion providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "azure-openai", "mock").
    fn name(&self) -> &str;

    /// Send the whole conversation and return the generated reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}

/// Fixed decoding parameters sent with every completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stream: bool,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.7,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stream: false,
        }
    }
}

/// Request to a completion provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    /// Full ordered conversation, persona first.
    pub messages: Vec<ChatMessage>,
    pub params: DecodingParams,
}

/// Response from a completion provider.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_decoding_params() {
        let params = DecodingParams::default();
        assert_eq!(params.max_tokens, 200);
        assert!((params.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(params.frequency_penalty, 0.0);
        assert_eq!(params.presence_penalty, 0.0);
        assert!(!params.stream);
    }
}
