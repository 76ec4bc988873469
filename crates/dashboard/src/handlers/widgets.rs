//! Dashboard widgets: summary, skills, logs, financials and social figures.

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use vault::{group_by_category, DashboardSummary, FinancialSnapshot};

use super::LimitQuery;
use crate::error::ApiResult;
use crate::server::AppState;

const SUGGESTION_LIMIT: usize = 10;

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(state.store.dashboard_summary().await?))
}

pub async fn drafts_count(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let count = state.store.drafts_count().await?;
    Ok(Json(json!({ "newCount": count })))
}

pub async fn suggestions(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let suggestions = state.store.suggestions(SUGGESTION_LIMIT).await?;
    Ok(Json(json!({ "suggestions": suggestions })))
}

pub async fn skills(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let skills = state.tasks.fetch_skills().await?;
    let categories = group_by_category(&skills);
    Ok(Json(json!({ "skills": skills, "categories": categories })))
}

pub async fn logs(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Value>> {
    let logs = state.tasks.fetch_logs(query.or(50)).await?;
    Ok(Json(json!({ "logs": logs })))
}

pub async fn financials(State(state): State<AppState>) -> ApiResult<Json<FinancialSnapshot>> {
    Ok(Json(state.tasks.fetch_financials().await?))
}

pub async fn social(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let stats = state.tasks.fetch_social().await?;
    Ok(Json(json!({ "stats": stats })))
}
