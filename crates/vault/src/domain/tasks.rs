//! Tasks domain facade (the dashboard's server actions).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::board::TaskBoard;
use crate::audit::AuditLog;
use crate::entities::{
    AuditEntry, Decision, FinancialSnapshot, NewTask, Priority, Skill, SocialStat, Task,
};
use crate::errors::VaultResult;
use crate::storage::{DecisionResult, TaskStore};

/// Fields of the task submission form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: Option<String>,
}

impl TaskForm {
    /// Both required fields carry non-blank text.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }

    fn priority(&self) -> Priority {
        match self.priority.as_deref().map(str::trim) {
            None | Some("") => Priority::Medium,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(priority = %raw, "Unknown priority, using medium");
                Priority::Medium
            }),
        }
    }
}

/// Tasks domain facade providing the dashboard operations
pub struct TasksDomain {
    storage: Arc<dyn TaskStore>,
    audit: AuditLog,
}

impl TasksDomain {
    /// Create a new tasks domain
    pub fn new(storage: Arc<dyn TaskStore>, audit: AuditLog) -> Self {
        Self { storage, audit }
    }

    pub fn storage(&self) -> &Arc<dyn TaskStore> {
        &self.storage
    }

    /// Pending and completed columns, read in parallel.
    pub async fn fetch_tasks(&self) -> VaultResult<TaskBoard> {
        let (pending, completed) =
            tokio::try_join!(self.storage.pending_tasks(), self.storage.completed_tasks())?;
        Ok(TaskBoard::new(pending, completed))
    }

    /// Submit the task form. Incomplete forms are ignored without touching
    /// the store and yield `Ok(None)`.
    pub async fn submit_task(&self, form: TaskForm) -> VaultResult<Option<Task>> {
        if !form.is_complete() {
            debug!("Ignoring incomplete task submission");
            return Ok(None);
        }

        let priority = form.priority();
        let task = self
            .storage
            .create_task(NewTask::new(form.title.trim(), form.content, priority))
            .await?;

        self.audit
            .record(
                &AuditEntry::new("task.created", "human", &task.id)
                    .with_detail("description", task.title.clone())
                    .with_detail("priority", priority.as_str()),
            )
            .await?;

        Ok(Some(task))
    }

    pub async fn fetch_skills(&self) -> VaultResult<Vec<Skill>> {
        self.storage.skills().await
    }

    /// Recent audit entries for the orchestrator terminal.
    pub async fn fetch_logs(&self, limit: usize) -> VaultResult<Vec<AuditEntry>> {
        self.audit.recent_entries(limit).await
    }

    pub async fn fetch_financials(&self) -> VaultResult<FinancialSnapshot> {
        self.storage.financials().await
    }

    pub async fn fetch_social(&self) -> VaultResult<Vec<SocialStat>> {
        self.storage.social_stats().await
    }

    /// Record a human decision and audit it.
    pub async fn decide(
        &self,
        id: &str,
        decision: Decision,
        note: Option<&str>,
    ) -> VaultResult<DecisionResult> {
        let result = self.storage.decide(id, decision, note).await?;

        let (action, status) = match decision {
            Decision::Approve => ("task.approved", "approved"),
            Decision::Reject => ("task.rejected", "rejected"),
        };
        let mut entry = AuditEntry::new(action, "human", id)
            .with_status(status)
            .with_detail("description", format!("Task {id} {status}"));
        if let Some(note) = note {
            entry = entry.with_detail("note", note);
        }
        if decision == Decision::Approve {
            entry = entry.approved_by("human");
        }
        self.audit.record(&entry).await?;

        Ok(result)
    }

    pub async fn approve(&self, id: &str, note: Option<&str>) -> VaultResult<DecisionResult> {
        self.decide(id, Decision::Approve, note).await
    }

    pub async fn reject(&self, id: &str, note: Option<&str>) -> VaultResult<DecisionResult> {
        self.decide(id, Decision::Reject, note).await
    }
}
