//! Chat and activity feed.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use vault::ChatReply;

use super::LimitQuery;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub message: String,
    #[serde(default)]
    pub context: Option<Value>,
}

/// `POST /api/chat/send`
pub async fn send(
    State(state): State<AppState>,
    Json(body): Json<ChatMessage>,
) -> ApiResult<Json<ChatReply>> {
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".to_string()));
    }
    Ok(Json(state.chat.respond(&body.message).await?))
}

/// `GET /api/chat/history?limit=50`
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Value>> {
    let messages = state.chat.history(query.or(50)).await?;
    Ok(Json(json!({ "messages": messages })))
}

/// `GET /api/activity?limit=10`
pub async fn activity(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Value>> {
    let activities = state.audit.recent_activity(query.or(10)).await?;
    Ok(Json(json!({ "activities": activities })))
}
