//! Chat-completion providers.
//!
//! `azure_openai` talks to a hosted Azure OpenAI deployment; `mock` is a
//! scripted provider for tests that counts how often it is called.

pub mod azure_openai;
pub mod mock;

pub use azure_openai::{AzureOpenAiConfig, AzureOpenAiProvider};
pub use mock::MockProvider;
