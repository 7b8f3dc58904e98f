//! LINE Webhook Receiver
//!
//! Signature validation and the webhook payload as LINE delivers it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

pub struct LineReceive;

impl LineReceive {
    /// Base64-encoded HMAC-SHA256 of `body` keyed by the channel secret.
    pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
        let mac = keyed_mac(secret, body)?;
        Some(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Validates the `x-line-signature` against the local channel secret.
    /// The comparison is constant-time.
    pub fn verify_signature(secret: &str, signature: &str, body: &[u8]) -> bool {
        let Ok(expected) = STANDARD.decode(signature.trim()) else {
            return false;
        };
        match keyed_mac(secret, body) {
            Some(mac) => mac.verify_slice(&expected).is_ok(),
            None => false,
        }
    }

    pub fn parse(body: &[u8]) -> serde_json::Result<WebhookPayload> {
        serde_json::from_slice(body)
    }
}

fn keyed_mac(secret: &str, body: &[u8]) -> Option<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(mac)
}

// ---------------------------------------------------------------------------
// LINE wire types
// ---------------------------------------------------------------------------

/// Top-level webhook body.
#[derive(Deserialize, Debug)]
pub struct WebhookPayload {
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: Option<MessageContent>,
    pub source: Option<EventSource>,
    pub reply_token: Option<String>,
    pub webhook_event_id: Option<String>,
    /// `active` or `standby`; standby channels must not reply.
    pub mode: Option<String>,
}

impl WebhookEvent {
    /// Text of a `message` event carrying a text message.
    pub fn text(&self) -> Option<&str> {
        if self.event_type != "message" {
            return None;
        }
        match &self.message {
            Some(MessageContent { kind, text, .. }) if kind == "text" => text.as_deref(),
            _ => None,
        }
    }

    pub fn is_standby(&self) -> bool {
        self.mode.as_deref() == Some("standby")
    }
}

#[derive(Deserialize, Debug)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Option<String>,
    pub text: Option<String>,
}

/// Where an event came from. Only a one-to-one chat identifies its user.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventSource {
    User {
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
    Group {
        #[serde(rename = "groupId")]
        group_id: String,
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
    Room {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl EventSource {
    /// User id of a one-to-one chat; `None` for groups, rooms, and unknown sources.
    pub fn direct_user_id(&self) -> Option<&str> {
        match self {
            EventSource::User { user_id } => user_id.as_deref(),
            _ => None,
        }
    }
}
