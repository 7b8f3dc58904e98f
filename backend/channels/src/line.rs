//! LINE adapter
//!
//! Receives webhook events from the LINE Messaging API, turns text messages
//! into replies, and sends them back with the Reply API.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use tunebot_conversation::ResponseGenerator;
use tunebot_core::{Sender, TuneError};

use crate::ChannelAdapter;
use crate::line_receive::{EventSource, LineReceive, SIGNATURE_HEADER, WebhookEvent};
use crate::line_send::{LineMessagingClient, MessagingApi};

/// Reply when the sender cannot be identified.
pub const UNRESOLVED_USER_TEXT: &str = "ユーザー情報を取得できませんでした。";

/// Reply when the completion API fails.
pub const COMPLETION_APOLOGY: &str =
    "申し訳ありません、ただいま応答を生成できませんでした。時間をおいてもう一度お試しください。";

/// Display name used in logs when no profile could be resolved.
const UNKNOWN_SENDER: &str = "unknown";

#[derive(Clone)]
pub struct LineConfig {
    pub channel_secret: String,
    pub channel_access_token: String,
    pub webhook_path: String,
    pub api_base_url: String,
}

pub struct LineAdapter {
    config: LineConfig,
    api: Arc<dyn MessagingApi>,
    generator: Arc<ResponseGenerator>,
}

impl LineAdapter {
    pub fn new(config: LineConfig, generator: Arc<ResponseGenerator>) -> Result<Self> {
        let api = LineMessagingClient::new(&config.api_base_url, &config.channel_access_token)?;
        Ok(Self::with_messaging_api(config, Arc::new(api), generator))
    }

    /// Build the adapter around any Messaging API implementation.
    pub fn with_messaging_api(
        config: LineConfig,
        api: Arc<dyn MessagingApi>,
        generator: Arc<ResponseGenerator>,
    ) -> Self {
        Self { config, api, generator }
    }
}

// ---------------------------------------------------------------------------
// Axum state
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    channel_secret: Arc<str>,
    api: Arc<dyn MessagingApi>,
    generator: Arc<ResponseGenerator>,
}

// ---------------------------------------------------------------------------
// Webhook handler
// ---------------------------------------------------------------------------

async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // 1. Verify the signature before touching the body
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return reject(TuneError::Signature("missing header".into()));
    };
    if !LineReceive::verify_signature(&state.channel_secret, signature, &body) {
        return reject(TuneError::Signature("mismatch".into()));
    }

    // 2. Parse JSON
    let payload = match LineReceive::parse(&body) {
        Ok(p) => p,
        Err(err) => return reject(TuneError::Payload(err.to_string())),
    };

    // 3. Dispatch events in delivery order
    let request_id = Uuid::new_v4();
    let span = info_span!("line_webhook", %request_id, events = payload.events.len());
    async {
        for event in &payload.events {
            dispatch_event(&state, event).await;
        }
    }
    .instrument(span)
    .await;

    (StatusCode::OK, "OK").into_response()
}

fn reject(err: TuneError) -> Response {
    warn!(error = %err, "[LINE] Rejecting webhook");
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

async fn dispatch_event(state: &AppState, event: &WebhookEvent) {
    let Some(text) = event.text() else {
        debug!(event_type = %event.event_type, "[LINE] Ignoring non-text event");
        return;
    };
    if event.is_standby() {
        debug!("[LINE] Channel in standby; not replying");
        return;
    }
    let Some(reply_token) = event.reply_token.as_deref() else {
        warn!("[LINE] Text message without reply token");
        return;
    };

    let messages = match resolve_sender(state, event.source.as_ref()).await {
        Some(sender) => {
            info!(user = %sender.id, name = %sender.display_name, "[LINE] Message received");
            match state.generator.generate(&sender, text).await {
                Ok(messages) => messages,
                Err(e) => {
                    error!(user = %sender.id, error = %e, "[LINE] Reply generation failed");
                    vec![COMPLETION_APOLOGY.to_string()]
                }
            }
        }
        None => {
            info!(sender = UNKNOWN_SENDER, "[LINE] Message from unresolved sender");
            unresolved_sender_reply(text)
        }
    };

    if let Err(e) = state.api.reply(reply_token, &messages).await {
        error!(error = %e, "[LINE] Failed to send reply");
    }
}

/// Look up the display name of a one-to-one chat's user.
async fn resolve_sender(state: &AppState, source: Option<&EventSource>) -> Option<Sender> {
    let user_id = source.and_then(EventSource::direct_user_id)?;
    match state.api.get_profile(user_id).await {
        Ok(profile) => Some(Sender::new(user_id, profile.display_name)),
        Err(e) => {
            warn!(user = %user_id, error = %e, "[LINE] Profile lookup failed");
            None
        }
    }
}

/// Fixed apology plus an echo of what the sender wrote.
pub fn unresolved_sender_reply(text: &str) -> Vec<String> {
    vec![UNRESOLVED_USER_TEXT.to_string(), format!("メッセージ：{text}")]
}

// ---------------------------------------------------------------------------
// ChannelAdapter impl
// ---------------------------------------------------------------------------

impl ChannelAdapter for LineAdapter {
    fn name(&self) -> &str {
        "line"
    }

    fn build_router(&self) -> Router {
        let state = AppState {
            channel_secret: Arc::from(self.config.channel_secret.as_str()),
            api: Arc::clone(&self.api),
            generator: Arc::clone(&self.generator),
        };
        info!("[LINE] Webhook mounted at {}", self.config.webhook_path);
        Router::new()
            .route(&self.config.webhook_path, post(webhook_handler))
            .with_state(state)
    }
}
