//! Task entity and its status/priority vocabulary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{VaultError, VaultResult};
use crate::frontmatter::parse_task_metadata;

/// Task status.
///
/// Statuses only move toward a terminal state; see [`TaskStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting for action or approval
    #[default]
    Pending,
    /// Finished by the agent
    Done,
    /// Approved by a human, not yet executed
    Approved,
    /// Rejected by a human
    Rejected,
    /// Executed after approval
    Completed,
}

impl TaskStatus {
    /// Whether no further transition is allowed out of this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Rejected | Self::Completed)
    }

    /// Check whether `next` is reachable from `self`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::Approved | Self::Rejected | Self::Done | Self::Completed
            ) | (Self::Approved, Self::Completed | Self::Done)
        )
    }

    /// Validate a transition for the given task.
    pub fn transition(self, id: &str, next: Self) -> VaultResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(VaultError::InvalidTransition {
                id: id.to_string(),
                from: self,
                to: next,
            })
        }
    }

    /// Parse a lowercase status label as written in frontmatter.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority, ordered from least to most pressing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Collapse the priority into the three-level importance shown on the board.
    pub const fn importance(self) -> Importance {
        match self {
            Self::Low => Importance::Low,
            Self::Medium => Importance::Medium,
            Self::High | Self::Urgent => Importance::High,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "normal" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" | "critical" => Ok(Self::Urgent),
            other => Err(VaultError::InvalidPriority(other.to_string())),
        }
    }
}

/// Board importance (high tasks get the critical marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Medium,
    High,
}

/// Workflow folders inside the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VaultFolder {
    #[serde(rename = "Needs_Action")]
    NeedsAction,
    #[serde(rename = "Pending_Approval")]
    PendingApproval,
    #[serde(rename = "In_Progress")]
    InProgress,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Rejected")]
    Rejected,
    #[serde(rename = "Done")]
    Done,
}

impl VaultFolder {
    pub const ALL: [Self; 6] = [
        Self::NeedsAction,
        Self::PendingApproval,
        Self::InProgress,
        Self::Approved,
        Self::Rejected,
        Self::Done,
    ];

    /// Order used when looking a task up by id.
    pub const SEARCH_ORDER: [Self; 6] = [
        Self::NeedsAction,
        Self::InProgress,
        Self::PendingApproval,
        Self::Approved,
        Self::Done,
        Self::Rejected,
    ];

    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::NeedsAction => "Needs_Action",
            Self::PendingApproval => "Pending_Approval",
            Self::InProgress => "In_Progress",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Done => "Done",
        }
    }

    /// Status implied by a file living in this folder.
    pub const fn status(self) -> TaskStatus {
        match self {
            Self::NeedsAction | Self::PendingApproval | Self::InProgress => TaskStatus::Pending,
            Self::Approved => TaskStatus::Approved,
            Self::Rejected => TaskStatus::Rejected,
            Self::Done => TaskStatus::Done,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.dir_name() == name)
    }
}

impl fmt::Display for VaultFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A task as read from a markdown file in the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub content: String,
    pub description: String,
    pub status: TaskStatus,
    pub folder: VaultFolder,
    pub priority: Priority,
    pub importance: Importance,
    pub source: String,
    pub risk_score: f64,
    pub complexity_score: f64,
    /// Modification time in epoch milliseconds
    pub timestamp: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Task {
    /// Build a task from a markdown document and its file metadata.
    pub fn from_markdown(
        filename: &str,
        folder: VaultFolder,
        content: String,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> Self {
        let id = filename
            .strip_suffix(".md")
            .unwrap_or(filename)
            .to_string();
        let meta = parse_task_metadata(&content);

        Self {
            id,
            filename: filename.to_string(),
            title: meta.title,
            description: meta.description,
            status: folder.status(),
            folder,
            priority: meta.priority,
            importance: meta.priority.importance(),
            source: meta.source,
            risk_score: meta.risk_score,
            complexity_score: meta.complexity_score,
            timestamp: modified.timestamp_millis(),
            created,
            modified,
            content,
        }
    }
}

/// Input for creating a task in `Needs_Action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "manual_task".to_string()
}

impl NewTask {
    pub fn new(title: impl Into<String>, content: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            priority,
            source: default_source(),
        }
    }
}

/// Human decision on a task waiting in `Pending_Approval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub const fn from_approved(approved: bool) -> Self {
        if approved {
            Self::Approve
        } else {
            Self::Reject
        }
    }

    pub const fn target_status(self) -> TaskStatus {
        match self {
            Self::Approve => TaskStatus::Approved,
            Self::Reject => TaskStatus::Rejected,
        }
    }
}
