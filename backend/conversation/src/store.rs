//! Per-sender conversation history.
//!
//! The persona lives in its own slot and is emitted at index 0 of the model
//! input; the turn history follows in insertion order, oldest first.
//!
//! With `HistoryLimit::unbounded()` every turn is kept for the process
//! lifetime, so prompt size (and token cost) grows linearly with the number
//! of turns. That is a known scaling limit; deployments should run with a
//! turn window.

use tunebot_core::{ChatMessage, ChatRole};

use crate::persona::Persona;

/// Sliding window over completed user/assistant turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimit {
    pub max_turns: Option<usize>,
}

impl HistoryLimit {
    pub fn unbounded() -> Self {
        Self { max_turns: None }
    }

    pub fn turns(max_turns: usize) -> Self {
        Self {
            max_turns: Some(max_turns),
        }
    }
}

impl From<Option<usize>> for HistoryLimit {
    fn from(max_turns: Option<usize>) -> Self {
        Self { max_turns }
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    persona: Option<ChatMessage>,
    history: Vec<ChatMessage>,
    limit: HistoryLimit,
}

impl Conversation {
    pub fn new(limit: HistoryLimit) -> Self {
        Self {
            persona: None,
            history: Vec::new(),
            limit,
        }
    }

    /// Drop all history and install the default persona.
    pub fn reset(&mut self) {
        self.history.clear();
        self.insert_front(Persona::Default.instruction());
    }

    /// Append a message to the end of the history.
    ///
    /// Appending an assistant message completes a turn, at which point the
    /// oldest turns beyond the window are evicted.
    pub fn append(&mut self, role: ChatRole, content: impl Into<String>) {
        self.history.push(ChatMessage::new(role, content));
        if role == ChatRole::Assistant {
            self.enforce_window();
        }
    }

    /// Set the system message sent at the front of the model input,
    /// replacing any previous one.
    pub fn insert_front(&mut self, content: impl Into<String>) {
        self.persona = Some(ChatMessage::system(content));
    }

    /// Remove a trailing user message whose turn never completed.
    pub fn discard_pending_user(&mut self) -> Option<ChatMessage> {
        match self.history.last() {
            Some(last) if last.role == ChatRole::User => self.history.pop(),
            _ => None,
        }
    }

    /// Persona followed by the full ordered history.
    pub fn to_model_input(&self) -> Vec<ChatMessage> {
        self.persona
            .iter()
            .chain(self.history.iter())
            .cloned()
            .collect()
    }

    pub fn persona(&self) -> Option<&ChatMessage> {
        self.persona.as_ref()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Length of the model input (persona included).
    pub fn len(&self) -> usize {
        self.history.len() + usize::from(self.persona.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enforce_window(&mut self) {
        let Some(max_turns) = self.limit.max_turns else {
            return;
        };
        let max_messages = max_turns.saturating_mul(2);
        if self.history.len() > max_messages {
            let excess = self.history.len() - max_messages;
            self.history.drain(..excess);
        }
        // Never start the window with a reply whose question was evicted.
        while matches!(self.history.first(), Some(m) if m.role == ChatRole::Assistant) {
            self.history.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(conversation: &mut Conversation, i: usize) {
        conversation.append(ChatRole::User, format!("question {i}"));
        conversation.append(ChatRole::Assistant, format!("answer {i}"));
    }

    #[test]
    fn test_append_preserves_order() {
        let mut c = Conversation::new(HistoryLimit::unbounded());
        c.append(ChatRole::User, "hi");
        c.append(ChatRole::Assistant, "hello");
        let roles: Vec<_> = c.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
    }

    #[test]
    fn test_insert_front_replaces_persona() {
        let mut c = Conversation::new(HistoryLimit::unbounded());
        c.insert_front("first");
        c.append(ChatRole::User, "hi");
        c.insert_front("second");

        let input = c.to_model_input();
        assert_eq!(input.len(), 2);
        assert_eq!(input[0], ChatMessage::system("second"));
        assert_eq!(input.iter().filter(|m| m.role == ChatRole::System).count(), 1);
    }

    #[test]
    fn test_reset_leaves_only_default_persona() {
        let mut c = Conversation::new(HistoryLimit::unbounded());
        c.insert_front(Persona::AppleMusic.instruction());
        turn(&mut c, 1);

        c.reset();
        assert_eq!(
            c.to_model_input(),
            vec![ChatMessage::system(Persona::Default.instruction())]
        );
    }

    #[test]
    fn test_unbounded_history_grows_linearly() {
        let mut c = Conversation::new(HistoryLimit::unbounded());
        for n in 1..=50 {
            c.insert_front(Persona::Spotify.instruction());
            turn(&mut c, n);
            assert_eq!(c.len(), 1 + 2 * n);
        }
    }

    #[test]
    fn test_window_keeps_last_turns() {
        let mut c = Conversation::new(HistoryLimit::turns(3));
        c.insert_front(Persona::Spotify.instruction());
        for n in 1..=10 {
            turn(&mut c, n);
            assert!(c.history().len() <= 6);
        }
        assert_eq!(c.history().len(), 6);
        assert_eq!(c.history()[0].content, "question 8");
        assert_eq!(c.history()[5].content, "answer 10");
        assert_eq!(c.to_model_input()[0].role, ChatRole::System);
    }

    #[test]
    fn test_window_never_starts_with_assistant() {
        let mut c = Conversation::new(HistoryLimit::turns(1));
        c.append(ChatRole::Assistant, "unprompted");
        c.append(ChatRole::User, "q");
        c.append(ChatRole::Assistant, "a");
        assert_eq!(c.history()[0].role, ChatRole::User);
        assert_eq!(c.history().len(), 2);
    }

    #[test]
    fn test_discard_pending_user() {
        let mut c = Conversation::new(HistoryLimit::unbounded());
        turn(&mut c, 1);
        c.append(ChatRole::User, "pending");
        assert_eq!(c.discard_pending_user().map(|m| m.content), Some("pending".into()));
        assert_eq!(c.history().len(), 2);
        // Nothing pending: a completed turn is left alone.
        assert!(c.discard_pending_user().is_none());
        assert_eq!(c.history().len(), 2);
    }
}
