//! Push subscription management and manual push triggers.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use chrono::{Local, Utc};
use notify::{DeliveryReport, Platform, PushEvent};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub fcm_token: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub fcm_token: String,
}

/// Friendly device name from the user agent, used when the app sends none.
fn device_from_user_agent(headers: &HeaderMap) -> &'static str {
    let agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if agent.contains("iPhone") || agent.contains("iPad") {
        "iOS Device"
    } else if agent.contains("Android") {
        "Android Device"
    } else if agent.contains("Windows") {
        "Windows Device"
    } else if agent.contains("Mac") {
        "Mac Device"
    } else {
        "Unknown Device"
    }
}

/// `POST /api/notifications/subscribe`
pub async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SubscribeRequest>,
) -> ApiResult<Json<Value>> {
    let token = body.fcm_token.trim();
    if token.is_empty() {
        return Err(ApiError::BadRequest("Invalid subscription: empty fcm_token".to_string()));
    }

    let platform = match body.platform.as_deref() {
        Some(p) => p.parse::<Platform>().map_err(ApiError::BadRequest)?,
        None => Platform::default(),
    };
    let device_name = body
        .device_name
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| device_from_user_agent(&headers).to_string());

    state
        .notifier
        .registry()
        .register(token, &device_name, platform)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Subscription registered for {device_name}"),
        "device_name": device_name,
    })))
}

/// `POST /api/notifications/unsubscribe`
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(body): Json<UnsubscribeRequest>,
) -> ApiResult<Json<Value>> {
    let removed = state.notifier.registry().unregister(body.fcm_token.trim()).await?;
    Ok(Json(json!({
        "success": removed,
        "message": if removed { "Subscription removed" } else { "Subscription not found" },
    })))
}

/// `GET /api/notifications/status`
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let counts = state.notifier.registry().counts().await;
    Json(json!({
        "status": "operational",
        "subscriptions": counts,
        "channels": state.notifier.channel_names(),
        "timestamp": Local::now().to_rfc3339(),
    }))
}

fn report_json(report: &DeliveryReport) -> Value {
    json!({
        "success": report.sent > 0,
        "sent": report.sent,
        "failed": report.failed,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct TestRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// `POST /api/notifications/test`. The body is optional.
pub async fn test(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let request: TestRequest = if body.iter().all(u8::is_ascii_whitespace) {
        TestRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let event = match request.title {
        Some(title) => PushEvent::Test {
            title,
            body: request
                .body
                .unwrap_or_else(|| "Push notifications are working!".to_string()),
            timestamp: Utc::now(),
        },
        None => PushEvent::test(),
    };
    let report = state.notifier.notify_and_wait(event).await;
    let mut value = report_json(&report);
    value["message"] = json!(format!("Test notification sent to {} device(s)", report.sent));
    Ok(Json(value))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalPush {
    pub task_id: String,
    pub task_title: String,
    pub task_description: String,
    #[serde(default = "half")]
    pub risk_score: f64,
    #[serde(default = "half")]
    pub complexity_score: f64,
}

const fn half() -> f64 {
    0.5
}

/// `POST /api/notifications/send/approval`
pub async fn send_approval(
    State(state): State<AppState>,
    Json(body): Json<ApprovalPush>,
) -> Json<Value> {
    info!(task_id = %body.task_id, "Sending approval request push");
    let report = state
        .notifier
        .notify_and_wait(PushEvent::ApprovalRequest {
            task_id: body.task_id,
            task_title: body.task_title,
            task_description: body.task_description,
            risk_score: body.risk_score,
            complexity_score: body.complexity_score,
            timestamp: Utc::now(),
        })
        .await;
    Json(report_json(&report))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionPush {
    pub title: String,
    pub description: String,
    pub action_id: String,
    #[serde(default)]
    pub priority: Option<String>,
}

/// `POST /api/notifications/send/suggestion`
pub async fn send_suggestion(
    State(state): State<AppState>,
    Json(body): Json<SuggestionPush>,
) -> Json<Value> {
    let report = state
        .notifier
        .notify_and_wait(PushEvent::Suggestion {
            title: body.title,
            description: body.description,
            action_id: body.action_id,
            priority: body.priority.unwrap_or_else(|| "normal".to_string()),
            timestamp: Utc::now(),
        })
        .await;
    Json(report_json(&report))
}

#[derive(Debug, Deserialize)]
pub struct DigestPush {
    pub summary: String,
    #[serde(default)]
    pub task_count: usize,
    #[serde(default)]
    pub urgent_count: usize,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// `POST /api/notifications/send/digest`
pub async fn send_digest(
    State(state): State<AppState>,
    Json(body): Json<DigestPush>,
) -> Json<Value> {
    let report = state
        .notifier
        .notify_and_wait(PushEvent::DailyDigest {
            summary: body.summary,
            task_count: body.task_count,
            urgent_count: body.urgent_count,
            suggestions: body.suggestions,
            timestamp: Utc::now(),
        })
        .await;
    Json(report_json(&report))
}

#[derive(Debug, Deserialize)]
pub struct CompletedPush {
    pub task_id: String,
    pub task_title: String,
    pub result_summary: String,
}

/// `POST /api/notifications/send/completed`
pub async fn send_completed(
    State(state): State<AppState>,
    Json(body): Json<CompletedPush>,
) -> Json<Value> {
    let report = state
        .notifier
        .notify_and_wait(PushEvent::TaskCompleted {
            task_id: body.task_id,
            task_title: body.task_title,
            result_summary: body.result_summary,
            timestamp: Utc::now(),
        })
        .await;
    Json(report_json(&report))
}
