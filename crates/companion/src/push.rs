//! Push payload routing and device registration.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::ApiClient;

/// Data map delivered with a push notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "taskId", default)]
    pub task_id: Option<String>,
    #[serde(rename = "actionId", default)]
    pub action_id: Option<String>,
}

/// Screen a tapped notification opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ApprovalDetail(String),
}

impl PushPayload {
    /// Parse a data map. Anything that is not an object yields an empty payload.
    pub fn from_data(data: &Value) -> Self {
        serde_json::from_value(data.clone()).unwrap_or_default()
    }

    pub fn route(&self) -> Option<Route> {
        match (self.kind.as_deref(), self.task_id.as_deref()) {
            (Some("approval_request"), Some(id)) if !id.is_empty() => {
                Some(Route::ApprovalDetail(id.to_string()))
            }
            _ => None,
        }
    }

    pub fn category(&self) -> notify::Category {
        match self.kind.as_deref() {
            Some("approval_request") => notify::Category::Approvals,
            Some("suggestion") => notify::Category::Suggestions,
            Some("daily_digest") => notify::Category::Digest,
            _ => notify::Category::System,
        }
    }
}

/// Register this device for pushes. Failures are logged, not returned.
pub async fn register_device(client: &ApiClient, token: &str, device_name: &str, platform: &str) -> bool {
    match client.register_push(token, device_name, platform).await {
        Ok(response) => {
            info!(device = device_name, message = %response.message, "Push token registered");
            response.success
        }
        Err(e) => {
            warn!(device = device_name, error = %e, "Failed to register push token");
            false
        }
    }
}
