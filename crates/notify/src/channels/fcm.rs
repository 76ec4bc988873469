//! Firebase Cloud Messaging channel (legacy HTTP API).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::PushChannel;
use crate::error::ChannelError;
use crate::events::PushEvent;

const ENV_SERVER_KEY: &str = "FCM_SERVER_KEY";
const ENV_ENDPOINT: &str = "FCM_ENDPOINT";
const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";
const ACCENT_COLOR: &str = "#2563eb";

/// Sends pushes through FCM with a server key.
pub struct FcmChannel {
    client: Client,
    endpoint: String,
    server_key: Option<String>,
}

impl FcmChannel {
    /// Build from `FCM_SERVER_KEY` and the optional `FCM_ENDPOINT` override.
    #[must_use]
    pub fn from_env() -> Self {
        let server_key = std::env::var(ENV_SERVER_KEY).ok().filter(|k| !k.is_empty());
        let endpoint = std::env::var(ENV_ENDPOINT).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Self::new(endpoint, server_key)
    }

    #[must_use]
    pub fn new(endpoint: impl Into<String>, server_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            server_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    to: &'a str,
    priority: &'static str,
    notification: FcmNotification<'a>,
    data: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: String,
    body: String,
    android_channel_id: &'a str,
    color: &'static str,
    sound: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    failure: u32,
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    error: Option<String>,
}

#[async_trait]
impl PushChannel for FcmChannel {
    fn name(&self) -> &'static str {
        "fcm"
    }

    fn enabled(&self) -> bool {
        self.server_key.is_some()
    }

    async fn send(&self, token: &str, event: &PushEvent) -> Result<(), ChannelError> {
        let Some(key) = &self.server_key else {
            return Err(ChannelError::NotConfigured(ENV_SERVER_KEY.to_string()));
        };

        let category = event.category();
        let message = FcmMessage {
            to: token,
            priority: "high",
            notification: FcmNotification {
                title: event.title(),
                body: event.body(),
                android_channel_id: category.channel_id(),
                color: ACCENT_COLOR,
                sound: "default",
            },
            data: event.data(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("key={key}"))
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Err(ChannelError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "FCM request failed");
            return Err(ChannelError::Other(format!("FCM returned {status}: {body}")));
        }

        let parsed: FcmResponse = response.json().await.unwrap_or_default();
        if parsed.failure > 0 {
            let reason = parsed
                .results
                .into_iter()
                .find_map(|r| r.error)
                .unwrap_or_else(|| "unknown".to_string());
            return match reason.as_str() {
                "NotRegistered" | "InvalidRegistration" | "MismatchSenderId" => {
                    Err(ChannelError::InvalidToken(reason))
                }
                _ => Err(ChannelError::Other(format!("FCM delivery failed: {reason}"))),
            };
        }

        debug!(channel_id = category.channel_id(), "FCM push delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn approval() -> PushEvent {
        PushEvent::ApprovalRequest {
            task_id: "T1".to_string(),
            task_title: "Pay invoice".to_string(),
            task_description: "Invoice #42".to_string(),
            risk_score: 0.8,
            complexity_score: 0.2,
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_not_configured_without_key() {
        let channel = FcmChannel::new(DEFAULT_ENDPOINT, None);
        assert!(!channel.enabled());
        let err = channel.send("tok", &approval()).await.unwrap_err();
        assert!(matches!(err, ChannelError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_sends_with_server_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fcm/send"))
            .and(header("authorization", "key=secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": 1, "failure": 0, "results": [{"message_id": "m1"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let channel = FcmChannel::new(format!("{}/fcm/send", server.uri()), Some("secret".into()));
        channel.send("tok", &approval()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["to"], "tok");
        assert_eq!(body["data"]["type"], "approval_request");
        assert_eq!(body["data"]["taskId"], "T1");
        assert_eq!(body["notification"]["android_channel_id"], "approvals");
    }

    #[tokio::test]
    async fn test_not_registered_is_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": 0, "failure": 1, "results": [{"error": "NotRegistered"}]})),
            )
            .mount(&server)
            .await;

        let channel = FcmChannel::new(server.uri(), Some("k".into()));
        let err = channel.send("stale", &approval()).await.unwrap_err();
        assert!(matches!(err, ChannelError::InvalidToken(ref r) if r == "NotRegistered"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .mount(&server)
            .await;

        let channel = FcmChannel::new(server.uri(), Some("k".into()));
        let err = channel.send("tok", &approval()).await.unwrap_err();
        assert!(matches!(err, ChannelError::RateLimited { retry_after_secs: 30 }));
    }
}
