//! Read-only value objects behind the dashboard widgets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Month-to-date financial snapshot exported from the accounting system.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
    pub margin: f64,
    /// False when no export exists and the zero placeholder is served
    #[serde(default)]
    pub live: bool,
}

/// Follower/engagement figures for one social platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialStat {
    pub platform: String,
    pub followers: u64,
    /// Signed change, e.g. `+5.2%`
    pub engagement: String,
}

impl SocialStat {
    pub fn is_growing(&self) -> bool {
        self.engagement.starts_with('+')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Online,
    Offline,
    Busy,
}

/// Counts shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub pending_count: usize,
    pub in_progress_count: usize,
    pub done_today_count: usize,
    pub urgent_count: usize,
    #[serde(default)]
    pub agent_status: AgentStatus,
    pub last_updated: DateTime<Utc>,
}
