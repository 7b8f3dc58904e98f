use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tunebot_core::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, TuneError,
};

const PROVIDER_NAME: &str = "azure-openai";

/// Connection settings for an Azure OpenAI deployment.
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub timeout: Duration,
}

/// Azure OpenAI chat-completions provider.
///
/// The request's `model` is used as the deployment name.
pub struct AzureOpenAiProvider {
    client: Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiProvider {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build Azure OpenAI HTTP client")?;
        Ok(Self { client, config })
    }

    fn completions_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.config.endpoint.trim_end_matches('/'),
            deployment
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stream: bool,
}

impl<'a> ChatRequest<'a> {
    fn from_request(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.params.max_tokens,
            temperature: request.params.temperature,
            frequency_penalty: request.params.frequency_penalty,
            presence_penalty: request.params.presence_penalty,
            stream: request.params.stream,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let start = Instant::now();
        let body = ChatRequest::from_request(request);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending request to Azure OpenAI"
        );

        let response = self
            .client
            .post(self.completions_url(&request.model))
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TuneError::completion(PROVIDER_NAME, format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(TuneError::completion(
                PROVIDER_NAME,
                format!("Azure OpenAI returned {status}: {error_body}"),
            )
            .into());
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            TuneError::completion(PROVIDER_NAME, format!("Failed to parse response: {e}"))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TuneError::completion(PROVIDER_NAME, "response contained no message"))?;

        let tokens_used = chat_response
            .usage
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        Ok(CompletionResponse {
            content,
            provider: PROVIDER_NAME.to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
