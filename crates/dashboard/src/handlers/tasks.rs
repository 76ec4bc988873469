//! Task listing, creation and approval.

use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use vault::{Decision, Task, TaskForm, VaultError, VaultFolder};

use super::LimitQuery;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    folder: Option<String>,
    limit: Option<usize>,
}

/// `GET /api/tasks?folder=&limit=`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let name = query.folder.as_deref().unwrap_or("Needs_Action");
    let tasks = match VaultFolder::from_name(name) {
        Some(folder) => state.store.list_folder(folder, limit).await?,
        None => Vec::new(),
    };
    Ok(Json(json!({ "count": tasks.len(), "tasks": tasks })))
}

/// `GET /api/tasks/pending`
pub async fn pending(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Value>> {
    let tasks = state
        .store
        .list_folder(VaultFolder::PendingApproval, query.or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(json!({ "count": tasks.len(), "tasks": tasks })))
}

/// `GET /api/tasks/{id}`
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Task>> {
    Ok(Json(state.store.get_task(&id).await?))
}

/// `POST /api/tasks` with either a form or a JSON body.
pub async fn submit(State(state): State<AppState>, request: Request) -> ApiResult<Response> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    let form = if is_json {
        let Json(form) = Json::<TaskForm>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        form
    } else {
        let Form(form) = Form::<TaskForm>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        form
    };

    match state.tasks.submit_task(form).await? {
        Some(task) => Ok((StatusCode::CREATED, Json(task)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[derive(Debug, Deserialize)]
struct DecisionBody {
    #[serde(default = "approve_by_default")]
    approved: bool,
    #[serde(default)]
    note: Option<String>,
}

const fn approve_by_default() -> bool {
    true
}

/// `POST /api/tasks/{id}/approve`. An empty body approves.
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        DecisionBody {
            approved: true,
            note: None,
        }
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    decide(&state, &id, Decision::from_approved(body.approved), body.note.as_deref()).await
}

/// `POST /api/tasks/{id}/reject`
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let note = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<DecisionBody>(&body)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
            .note
    };
    decide(&state, &id, Decision::Reject, note.as_deref()).await
}

async fn decide(
    state: &AppState,
    id: &str,
    decision: Decision,
    note: Option<&str>,
) -> ApiResult<Json<Value>> {
    let result = state.tasks.decide(id, decision, note).await.map_err(|e| match e {
        VaultError::TaskNotFound(_) => {
            ApiError::NotFound("Task not found in Pending_Approval".to_string())
        }
        other => other.into(),
    })?;

    let status = decision.target_status();
    info!(task_id = %id, status = %status, moved_to = %result.moved_to, "Decision applied");
    Ok(Json(json!({
        "status": status.as_str(),
        "message": format!("Task {id} {status}"),
    })))
}
