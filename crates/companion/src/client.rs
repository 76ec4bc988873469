//! Typed REST client for the dashboard API.

use std::time::Duration;

use reqwest::{header, Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use vault::{ActivityItem, ChatRecord, ChatReply, DashboardSummary, Task};

use crate::error::ClientError;

const TIMEOUT: Duration = Duration::from_secs(10);

/// `{tasks, count}` list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub count: usize,
}

/// Reply to an approve or reject call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecisionResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthComponents {
    pub api: String,
    pub vault: bool,
    pub notifications: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    pub components: HealthComponents,
    pub timestamp: String,
}

/// Reply to a push registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub device_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Messages {
    messages: Vec<ChatRecord>,
}

#[derive(Debug, Deserialize)]
struct Activities {
    activities: Vec<ActivityItem>,
}

#[derive(Debug, Deserialize)]
struct DraftCount {
    #[serde(rename = "newCount")]
    new_count: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Serialize)]
struct DecisionBody<'a> {
    approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

/// Client for the Digital FTE REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        // Endpoint paths are joined relative to the base, so a path prefix must end in '/'.
        if !base_url.path().ends_with('/') {
            let prefixed = format!("{}/", base_url.path());
            base_url.set_path(&prefixed);
        }
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let http = Client::builder()
            .timeout(TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ClientError> {
        debug!(path, "GET");
        let response = self
            .http
            .get(self.url(path)?)
            .query(query)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        debug!(path, "POST");
        let response = self
            .http
            .post(self.url(path)?)
            .json(body)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        decode(response).await
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        self.get("/api/health", &[]).await
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary, ClientError> {
        self.get("/api/dashboard", &[]).await
    }

    pub async fn tasks(&self, folder: &str, limit: usize) -> Result<TaskList, ClientError> {
        self.get(
            "/api/tasks",
            &[("folder", folder.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn pending_tasks(&self, limit: usize) -> Result<TaskList, ClientError> {
        self.get("/api/tasks/pending", &[("limit", limit.to_string())])
            .await
    }

    pub async fn task(&self, id: &str) -> Result<Task, ClientError> {
        self.get(&format!("/api/tasks/{id}"), &[]).await
    }

    pub async fn approve_task(&self, id: &str, note: Option<&str>) -> Result<DecisionResponse, ClientError> {
        self.decide(id, true, note).await
    }

    pub async fn reject_task(&self, id: &str, note: Option<&str>) -> Result<DecisionResponse, ClientError> {
        self.decide(id, false, note).await
    }

    async fn decide(
        &self,
        id: &str,
        approved: bool,
        note: Option<&str>,
    ) -> Result<DecisionResponse, ClientError> {
        self.post(
            &format!("/api/tasks/{id}/approve"),
            &DecisionBody { approved, note },
        )
        .await
    }

    pub async fn drafts_count(&self) -> Result<usize, ClientError> {
        let count: DraftCount = self.get("/api/drafts/count", &[]).await?;
        Ok(count.new_count)
    }

    pub async fn send_chat(&self, message: &str, context: Option<Value>) -> Result<ChatReply, ClientError> {
        self.post(
            "/api/chat/send",
            &json!({ "message": message, "context": context }),
        )
        .await
    }

    pub async fn chat_history(&self, limit: usize) -> Result<Vec<ChatRecord>, ClientError> {
        let body: Messages = self
            .get("/api/chat/history", &[("limit", limit.to_string())])
            .await?;
        Ok(body.messages)
    }

    pub async fn activity(&self, limit: usize) -> Result<Vec<ActivityItem>, ClientError> {
        let body: Activities = self
            .get("/api/activity", &[("limit", limit.to_string())])
            .await?;
        Ok(body.activities)
    }

    pub async fn register_push(
        &self,
        token: &str,
        device_name: &str,
        platform: &str,
    ) -> Result<RegisterResponse, ClientError> {
        self.post(
            "/api/notifications/subscribe",
            &json!({ "fcm_token": token, "device_name": device_name, "platform": platform }),
        )
        .await
    }
}

/// Map non-2xx answers to `ClientError::Status`, keeping the server's `detail`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.detail)
            .unwrap_or(text);
        return Err(ClientError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    response.json().await.map_err(ClientError::Decode)
}
