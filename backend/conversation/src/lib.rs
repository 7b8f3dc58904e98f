//! Conversational core: which persona answers, what history the model sees,
//! and whether a message is greeted or forwarded to the completion API.

pub mod generator;
pub mod persona;
pub mod sessions;
pub mod store;

pub use generator::{GeneratorSettings, ResponseGenerator, GREETING, RESET_CONFIRMATION};
pub use persona::Persona;
pub use sessions::{ConversationPhase, ConversationState, SessionRegistry};
pub use store::{Conversation, HistoryLimit};
