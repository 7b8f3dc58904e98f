use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tunebot_core::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, TuneError};

/// A mock completion provider that returns canned responses and records calls.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    fail_with: Option<String>,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            fail_with: None,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Every call fails with a completion error carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Number of times `complete` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages received by the most recent call.
    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = req.messages.clone();
        }

        if let Some(message) = &self.fail_with {
            return Err(TuneError::completion(self.name.clone(), message.clone()).into());
        }

        Ok(CompletionResponse {
            content: self
                .fixed_response
                .clone()
                .unwrap_or_else(|| "Mock response".to_string()),
            provider: self.name.clone(),
            model: req.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunebot_core::DecodingParams;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "mock".into(),
            messages: vec![ChatMessage::user("hi")],
            params: DecodingParams::default(),
        }
    }

    #[tokio::test]
    async fn test_counts_calls_and_records_input() {
        let provider = MockProvider::new("mock").with_response("canned");
        let response = provider.complete(&request()).await.unwrap();
        assert_eq!(response.content, "canned");
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.last_messages(), vec![ChatMessage::user("hi")]);
    }

    #[tokio::test]
    async fn test_failing_provider_still_counts() {
        let provider = MockProvider::new("mock").failing("boom");
        assert!(provider.complete(&request()).await.is_err());
        assert_eq!(provider.calls(), 1);
    }
}
