//! Push events sent to the companion app.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification category. Each maps to an Android channel and to a
/// per-device toggle in the companion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Approvals,
    Suggestions,
    Digest,
    System,
}

impl Category {
    /// Android notification channel id.
    #[must_use]
    pub const fn channel_id(&self) -> &'static str {
        match self {
            Self::Approvals => "approvals",
            Self::Suggestions => "suggestions",
            Self::Digest | Self::System => "default",
        }
    }
}

/// Events that can trigger a push notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// A task needs a human decision
    ApprovalRequest {
        task_id: String,
        task_title: String,
        task_description: String,
        #[serde(default = "default_score")]
        risk_score: f64,
        #[serde(default = "default_score")]
        complexity_score: f64,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// An approved task has been executed
    TaskCompleted {
        task_id: String,
        task_title: String,
        result_summary: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// Morning summary
    DailyDigest {
        summary: String,
        #[serde(default)]
        task_count: usize,
        #[serde(default)]
        urgent_count: usize,
        #[serde(default)]
        suggestions: Vec<String>,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// Proactive suggestion from the agent
    Suggestion {
        title: String,
        description: String,
        action_id: String,
        #[serde(default = "default_priority")]
        priority: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// Manual test push
    Test {
        #[serde(default = "default_test_title")]
        title: String,
        #[serde(default = "default_test_body")]
        body: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

fn default_score() -> f64 {
    0.5
}

fn default_priority() -> String {
    "normal".to_string()
}

fn default_test_title() -> String {
    "Test from Digital FTE".to_string()
}

fn default_test_body() -> String {
    "Push notifications are working!".to_string()
}

impl PushEvent {
    /// Test push with the default wording.
    #[must_use]
    pub fn test() -> Self {
        Self::Test {
            title: default_test_title(),
            body: default_test_body(),
            timestamp: Utc::now(),
        }
    }

    /// Notification title.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::ApprovalRequest { task_title, .. } => format!("Approval needed: {task_title}"),
            Self::TaskCompleted { task_title, .. } => format!("Completed: {task_title}"),
            Self::DailyDigest { task_count, .. } => format!("Daily digest: {task_count} tasks"),
            Self::Suggestion { title, .. } | Self::Test { title, .. } => title.clone(),
        }
    }

    /// Notification body text.
    #[must_use]
    pub fn body(&self) -> String {
        match self {
            Self::ApprovalRequest {
                task_description,
                risk_score,
                ..
            } => {
                let risk = if *risk_score >= 0.7 {
                    "High risk"
                } else if *risk_score >= 0.4 {
                    "Medium risk"
                } else {
                    "Low risk"
                };
                format!("{risk} · {}", truncate(task_description, 120))
            }
            Self::TaskCompleted { result_summary, .. } => truncate(result_summary, 160),
            Self::DailyDigest {
                summary,
                urgent_count,
                ..
            } => {
                if *urgent_count > 0 {
                    format!("{urgent_count} urgent · {}", truncate(summary, 140))
                } else {
                    truncate(summary, 160)
                }
            }
            Self::Suggestion { description, .. } => truncate(description, 160),
            Self::Test { body, .. } => body.clone(),
        }
    }

    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::ApprovalRequest { .. } => Category::Approvals,
            Self::Suggestion { .. } => Category::Suggestions,
            Self::DailyDigest { .. } => Category::Digest,
            Self::TaskCompleted { .. } | Self::Test { .. } => Category::System,
        }
    }

    /// Data map delivered alongside the notification. The companion app
    /// routes on `type` (and `taskId` for approval requests).
    #[must_use]
    pub fn data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        match self {
            Self::ApprovalRequest { task_id, .. } => {
                data.insert("type".into(), "approval_request".into());
                data.insert("taskId".into(), task_id.clone());
            }
            Self::TaskCompleted { task_id, .. } => {
                data.insert("type".into(), "task_completed".into());
                data.insert("taskId".into(), task_id.clone());
            }
            Self::DailyDigest { .. } => {
                data.insert("type".into(), "daily_digest".into());
            }
            Self::Suggestion { action_id, .. } => {
                data.insert("type".into(), "suggestion".into());
                data.insert("actionId".into(), action_id.clone());
            }
            Self::Test { .. } => {
                data.insert("type".into(), "test".into());
                data.insert("url".into(), "/".into());
            }
        }
        data
    }

    /// Get the timestamp for this event.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ApprovalRequest { timestamp, .. }
            | Self::TaskCompleted { timestamp, .. }
            | Self::DailyDigest { timestamp, .. }
            | Self::Suggestion { timestamp, .. }
            | Self::Test { timestamp, .. } => *timestamp,
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
