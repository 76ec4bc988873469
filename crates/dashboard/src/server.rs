//! HTTP server for the dashboard API.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vault::{AuditLog, ChatLog, ChatRouter, FileVault, TaskStore, TasksDomain};

use crate::config::Config;
use crate::handlers::{chat, notifications, tasks, widgets};
use notify::Notifier;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn TaskStore>,
    pub tasks: Arc<TasksDomain>,
    pub audit: AuditLog,
    pub chat: Arc<ChatRouter>,
    pub notifier: Arc<Notifier>,
}

impl AppState {
    /// Wire the file vault, audit log, chat router and notifier together.
    pub fn new(config: Config, notifier: Notifier) -> Self {
        let store: Arc<dyn TaskStore> = Arc::new(FileVault::new(&config.vault_path));
        let audit = AuditLog::in_vault(&config.vault_path);
        let tasks = Arc::new(TasksDomain::new(Arc::clone(&store), audit.clone()));
        let chat = Arc::new(ChatRouter::new(
            Arc::clone(&store),
            ChatLog::in_vault(&config.vault_path),
        ));
        Self {
            config: Arc::new(config),
            store,
            tasks,
            audit,
            chat,
            notifier: Arc::new(notifier),
        }
    }
}

/// Build the HTTP router for the dashboard service.
pub fn build_router(state: AppState) -> Router {
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(state.config.body_limit));

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .route("/api/dashboard", get(widgets::dashboard))
        // Tasks
        .route("/api/tasks", get(tasks::list).post(tasks::submit))
        .route("/api/tasks/pending", get(tasks::pending))
        .route("/api/tasks/{id}", get(tasks::show))
        .route("/api/tasks/{id}/approve", post(tasks::approve))
        .route("/api/tasks/{id}/reject", post(tasks::reject))
        .route("/api/drafts/count", get(widgets::drafts_count))
        .route("/api/suggestions", get(widgets::suggestions))
        // Chat and activity
        .route("/api/chat/send", post(chat::send))
        .route("/api/chat/history", get(chat::history))
        .route("/api/activity", get(chat::activity))
        // Dashboard widgets
        .route("/api/skills", get(widgets::skills))
        .route("/api/logs", get(widgets::logs))
        .route("/api/financials", get(widgets::financials))
        .route("/api/social", get(widgets::social))
        // Push notifications
        .route("/api/notifications/subscribe", post(notifications::subscribe))
        .route("/api/notifications/unsubscribe", post(notifications::unsubscribe))
        .route("/api/notifications/status", get(notifications::status))
        .route("/api/notifications/test", post(notifications::test))
        .route("/api/notifications/send/approval", post(notifications::send_approval))
        .route("/api/notifications/send/suggestion", post(notifications::send_suggestion))
        .route("/api/notifications/send/digest", post(notifications::send_digest))
        .route("/api/notifications/send/completed", post(notifications::send_completed))
        .layer(layers)
        .with_state(state)
}

/// Service banner.
async fn root() -> Json<Value> {
    Json(json!({
        "status": "operational",
        "service": "Digital FTE API",
        "version": env!("CARGO_PKG_VERSION"),
        "features": ["push_notifications", "task_management", "agentic_intelligence"],
        "timestamp": Local::now().to_rfc3339(),
    }))
}

/// Health check with component status.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "components": {
            "api": "operational",
            "vault": state.store.is_available().await,
            "notifications": state.notifier.is_enabled(),
        },
        "timestamp": Local::now().to_rfc3339(),
    }))
}
