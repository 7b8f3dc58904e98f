//! Per-sender conversation registry.
//!
//! The outer lock is only held to find or create an entry; each sender's
//! state has its own lock, held for a whole turn, so one sender's messages
//! are processed strictly in order while different senders run in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::store::{Conversation, HistoryLimit};

/// Where a conversation is in its greet-then-converse lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationPhase {
    #[default]
    AwaitingGreeting,
    Conversing,
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub phase: ConversationPhase,
    pub conversation: Conversation,
}

impl ConversationState {
    pub fn new(limit: HistoryLimit) -> Self {
        Self {
            phase: ConversationPhase::default(),
            conversation: Conversation::new(limit),
        }
    }
}

pub type SharedConversation = Arc<Mutex<ConversationState>>;

#[derive(Clone)]
pub struct SessionRegistry {
    limit: HistoryLimit,
    entries: Arc<Mutex<HashMap<String, SharedConversation>>>,
}

impl SessionRegistry {
    pub fn new(limit: HistoryLimit) -> Self {
        Self {
            limit,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the sender's conversation, creating a fresh one on first contact.
    pub async fn get_or_create(&self, sender_id: &str) -> SharedConversation {
        let mut entries = self.entries.lock().await;
        entries
            .entry(sender_id.to_string())
            .or_insert_with(|| {
                debug!(sender = %sender_id, "New conversation");
                Arc::new(Mutex::new(ConversationState::new(self.limit)))
            })
            .clone()
    }

    /// Copy of the sender's current state, if any.
    pub async fn snapshot(&self, sender_id: &str) -> Option<ConversationState> {
        let entry = self.entries.lock().await.get(sender_id).cloned()?;
        let state = entry.lock().await;
        Some(state.clone())
    }

    /// Number of senders with a conversation.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunebot_core::ChatRole;

    #[tokio::test]
    async fn test_same_sender_shares_state() {
        let registry = SessionRegistry::new(HistoryLimit::unbounded());
        let a = registry.get_or_create("U1").await;
        a.lock().await.conversation.append(ChatRole::User, "hi");

        let again = registry.get_or_create("U1").await;
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(again.lock().await.conversation.history().len(), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_senders_are_isolated() {
        let registry = SessionRegistry::new(HistoryLimit::unbounded());
        registry
            .get_or_create("U1")
            .await
            .lock()
            .await
            .phase = ConversationPhase::Conversing;

        let other = registry.get_or_create("U2").await;
        assert_eq!(other.lock().await.phase, ConversationPhase::AwaitingGreeting);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_snapshot_of_unknown_sender() {
        let registry = SessionRegistry::new(HistoryLimit::turns(5));
        assert!(registry.snapshot("nobody").await.is_none());
        assert!(registry.is_empty().await);
    }
}
