pub mod error;
pub mod traits;
pub mod types;

pub use error::TuneError;
pub use traits::{CompletionRequest, CompletionResponse, DecodingParams, LlmProvider};
pub use types::{ChatMessage, ChatRole, Sender};
