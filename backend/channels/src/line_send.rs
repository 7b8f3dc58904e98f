//! LINE Senders
//!
//! Profile lookup and reply delivery through the LINE Messaging API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use tunebot_core::TuneError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A LINE user's public profile.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub picture_url: Option<String>,
    pub status_message: Option<String>,
}

/// The Messaging API operations the webhook dispatcher needs.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Profile>;

    /// Send text messages, in order, with a webhook reply token.
    async fn reply(&self, reply_token: &str, messages: &[String]) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// reqwest-backed Messaging API client.
pub struct LineMessagingClient {
    http: Client,
    base_url: String,
    channel_access_token: String,
}

impl LineMessagingClient {
    pub fn new(base_url: impl Into<String>, channel_access_token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build LINE HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            channel_access_token: channel_access_token.into(),
        })
    }
}

#[async_trait]
impl MessagingApi for LineMessagingClient {
    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        let res = self
            .http
            .get(format!("{}/v2/bot/profile/{}", self.base_url, user_id))
            .bearer_auth(&self.channel_access_token)
            .send()
            .await
            .map_err(|e| TuneError::Messaging(format!("profile request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let err = res.text().await.unwrap_or_default();
            return Err(TuneError::Messaging(format!("profile lookup returned {status}: {err}")).into());
        }

        let profile: Profile = res
            .json()
            .await
            .map_err(|e| TuneError::Messaging(format!("malformed profile: {e}")))?;
        debug!(user = %profile.user_id, "[LINE] Resolved profile");
        Ok(profile)
    }

    async fn reply(&self, reply_token: &str, messages: &[String]) -> Result<()> {
        let body = ReplyRequest {
            reply_token,
            messages: messages
                .iter()
                .map(|text| TextMessage { kind: "text", text })
                .collect(),
        };

        let res = self
            .http
            .post(format!("{}/v2/bot/message/reply", self.base_url))
            .bearer_auth(&self.channel_access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TuneError::Messaging(format!("reply request failed: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            let err = res.text().await.unwrap_or_default();
            error!("[LINE] reply failed: {} {}", status, err);
            return Err(TuneError::Messaging(format!("reply returned {status}: {err}")).into());
        }
        debug!(count = messages.len(), "[LINE] Reply sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer access-token")
    }

    #[tokio::test]
    async fn get_profile_parses_display_name() {
        let app = Router::new().route(
            "/v2/bot/profile/:user_id",
            get(|Path(user_id): Path<String>, headers: HeaderMap| async move {
                if !authorized(&headers) {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Ok(Json(serde_json::json!({
                    "userId": user_id,
                    "displayName": "ゆうた",
                    "pictureUrl": "https://profile.line-scdn.net/abc",
                    "language": "ja"
                })))
            }),
        );
        let base = serve(app).await;

        let client = LineMessagingClient::new(base, "access-token").unwrap();
        let profile = client.get_profile("U123").await.unwrap();
        assert_eq!(profile.user_id, "U123");
        assert_eq!(profile.display_name, "ゆうた");
        assert!(profile.status_message.is_none());
    }

    #[tokio::test]
    async fn get_profile_error_status_is_messaging_error() {
        let app = Router::new().route(
            "/v2/bot/profile/:user_id",
            get(|| async { (StatusCode::NOT_FOUND, r#"{"message":"Not found"}"#) }),
        );
        let base = serve(app).await;

        let client = LineMessagingClient::new(base, "access-token").unwrap();
        let err = client.get_profile("U404").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<TuneError>(), Some(TuneError::Messaging(_))));
    }

    #[tokio::test]
    async fn reply_posts_text_messages_in_order() {
        let app = Router::new().route(
            "/v2/bot/message/reply",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                if !authorized(&headers) {
                    return StatusCode::UNAUTHORIZED;
                }
                assert_eq!(body["replyToken"], "reply-token");
                assert_eq!(body["messages"][0], serde_json::json!({"type": "text", "text": "one"}));
                assert_eq!(body["messages"][1]["text"], "two");
                StatusCode::OK
            }),
        );
        let base = serve(app).await;

        let client = LineMessagingClient::new(format!("{base}/"), "access-token").unwrap();
        client
            .reply("reply-token", &["one".to_string(), "two".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reply_rejected_is_error() {
        let app = Router::new().route(
            "/v2/bot/message/reply",
            post(|| async { (StatusCode::BAD_REQUEST, r#"{"message":"Invalid reply token"}"#) }),
        );
        let base = serve(app).await;

        let client = LineMessagingClient::new(base, "access-token").unwrap();
        let err = client.reply("expired", &["hi".to_string()]).await.unwrap_err();
        assert!(err.to_string().contains("Invalid reply token"));
    }
}
