use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use tunebot_core::{ChatRole, CompletionRequest, DecodingParams, LlmProvider, Sender};
use tunebot_logging::{ConversationEvent, ConversationEventLogger};

use crate::persona::apply_persona;
use crate::sessions::{ConversationPhase, ConversationState, SessionRegistry};
use crate::store::HistoryLimit;

/// Sent once per conversation, before the model is ever called.
pub const GREETING: &str = "こんにちは😁😁今の気分や好みを教えてください‼あなたにぴったりなSpotifyプレイリストをおすすめします🎧🎶🎸🎼🎤🎹 Apple Musicにも対応しますよ🍎🍏";

pub const RESET_CONFIRMATION: &str = "会話をリセットしました🔄 もう一度メッセージを送ってください🎧";

const RESET_COMMANDS: &[&str] = &["リセット", "初期化", "クリア", "reset", "clear"];

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Model (deployment) name sent with every completion request.
    pub model: String,
    pub params: DecodingParams,
    pub history_limit: HistoryLimit,
    /// Honour reset keywords. Off unless explicitly enabled.
    pub reset_commands_enabled: bool,
}

impl GeneratorSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            params: DecodingParams::default(),
            history_limit: HistoryLimit::unbounded(),
            reset_commands_enabled: false,
        }
    }
}

/// Turns an incoming message into the reply messages for its sender.
pub struct ResponseGenerator {
    provider: Arc<dyn LlmProvider>,
    sessions: SessionRegistry,
    settings: GeneratorSettings,
}

impl ResponseGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: GeneratorSettings) -> Self {
        Self {
            provider,
            sessions: SessionRegistry::new(settings.history_limit),
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Produce the reply for one message.
    ///
    /// The first message of a conversation is answered with [`GREETING`]
    /// without calling the model. Every later message is sent to the model
    /// together with the persona and the history. A completion failure is
    /// returned to the caller and leaves the history as it was.
    #[instrument(skip(self, sender, text), fields(sender = %sender.id))]
    pub async fn generate(&self, sender: &Sender, text: &str) -> Result<Vec<String>> {
        let entry = self.sessions.get_or_create(&sender.id).await;
        let mut state = entry.lock().await;

        if self.settings.reset_commands_enabled && is_reset_command(text) {
            state.conversation.reset();
            state.phase = ConversationPhase::AwaitingGreeting;
            ConversationEventLogger::log_event(&sender.id, ConversationEvent::Reset);
            info!("Conversation reset by command");
            return Ok(vec![RESET_CONFIRMATION.to_string()]);
        }

        match state.phase {
            ConversationPhase::AwaitingGreeting => {
                state.phase = ConversationPhase::Conversing;
                ConversationEventLogger::log_event(&sender.id, ConversationEvent::Greeted);
                info!(display_name = %sender.display_name, "Greeting new conversation");
                Ok(vec![GREETING.to_string()])
            }
            ConversationPhase::Conversing => {
                let reply = self.converse(&sender.id, &mut state, text).await?;
                Ok(vec![reply])
            }
        }
    }

    async fn converse(
        &self,
        sender_id: &str,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<String> {
        let persona = apply_persona(text, &mut state.conversation);
        ConversationEventLogger::log_event(
            sender_id,
            ConversationEvent::PersonaSelected {
                persona: persona.name().to_string(),
            },
        );

        state.conversation.append(ChatRole::User, text);
        ConversationEventLogger::log_event(
            sender_id,
            ConversationEvent::Message {
                role: ChatRole::User.to_string(),
                content: text.to_string(),
            },
        );

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: state.conversation.to_model_input(),
            params: self.settings.params,
        };
        debug!(
            provider = self.provider.name(),
            messages = request.messages.len(),
            "Requesting completion"
        );

        let response = match self.provider.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                state.conversation.discard_pending_user();
                warn!(error = %e, "Completion failed; turn discarded");
                ConversationEventLogger::log_event(
                    sender_id,
                    ConversationEvent::Error {
                        error_msg: e.to_string(),
                    },
                );
                return Err(e);
            }
        };

        info!(
            persona = %persona,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            history = state.conversation.history().len() + 1,
            "Completion received"
        );

        state
            .conversation
            .append(ChatRole::Assistant, response.content.clone());
        ConversationEventLogger::log_event(
            sender_id,
            ConversationEvent::Message {
                role: ChatRole::Assistant.to_string(),
                content: response.content.clone(),
            },
        );

        Ok(response.content)
    }
}

fn is_reset_command(text: &str) -> bool {
    let trimmed = text.trim();
    RESET_COMMANDS
        .iter()
        .any(|cmd| cmd.eq_ignore_ascii_case(trimmed))
}
