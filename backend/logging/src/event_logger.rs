//! Conversation Event Logger
//!
//! Structured per-sender events (greeting, persona choice, messages, errors)
//! emitted on the `conversation_events` tracing target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ConversationEvent {
    Greeted,
    PersonaSelected { persona: String },
    Message { role: String, content: String },
    Reset,
    Error { error_msg: String },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub sender_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ConversationEvent,
}

impl EventLogEntry {
    /// Build an entry with every free-text field redacted.
    pub fn new(sender_id: &str, mut event: ConversationEvent) -> Self {
        match &mut event {
            ConversationEvent::Message { content, .. } => {
                *content = redact_sensitive_data(content);
            }
            ConversationEvent::Error { error_msg } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            ConversationEvent::Greeted
            | ConversationEvent::Reset
            | ConversationEvent::PersonaSelected { .. } => {}
        }

        Self {
            sender_id: sender_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct ConversationEventLogger;

impl ConversationEventLogger {
    pub fn log_event(sender_id: &str, event: ConversationEvent) {
        let entry = EventLogEntry::new(sender_id, event);
        info!(target: "conversation_events", event = ?entry, "Conversation event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_redacts_error_text() {
        let entry = EventLogEntry::new(
            "U123",
            ConversationEvent::Error {
                error_msg: "401 for Bearer abc.def.ghi".into(),
            },
        );
        assert_eq!(entry.sender_id, "U123");
        match entry.event {
            ConversationEvent::Error { error_msg } => assert!(!error_msg.contains("abc.def.ghi")),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_entry_serializes_with_type_tag() {
        let entry = EventLogEntry::new(
            "U123",
            ConversationEvent::PersonaSelected {
                persona: "apple".into(),
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "PersonaSelected");
        assert_eq!(json["event"]["persona"], "apple");
    }
}
