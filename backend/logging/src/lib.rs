//! Structured logging for tunebot.
//!
//! Handles subscriber setup, log redaction, and per-sender conversation event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ConversationEvent, ConversationEventLogger, EventLogEntry};
pub use logger::{LogOptions, init_logger};
pub use redact::redact_sensitive_data;
