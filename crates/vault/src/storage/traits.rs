//! Storage trait for vault persistence.

use async_trait::async_trait;
use serde_json::Value;

use crate::entities::{
    DashboardSummary, Decision, FinancialSnapshot, NewTask, Skill, SocialStat, Task, VaultFolder,
};
use crate::errors::VaultResult;

/// Result of a human decision on a pending task.
#[derive(Debug, Clone)]
pub struct DecisionResult {
    pub task_id: String,
    pub decision: Decision,
    /// Folder the task file was moved into
    pub moved_to: VaultFolder,
}

/// Task store backing the dashboard and the REST API.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create the vault folder layout if missing.
    async fn initialize(&self) -> VaultResult<()>;

    /// Whether the vault root exists.
    async fn is_available(&self) -> bool;

    /// Tasks in a folder, newest first, truncated to `limit`.
    async fn list_folder(&self, folder: VaultFolder, limit: usize) -> VaultResult<Vec<Task>>;

    /// Everything still waiting on someone (needs action, pending approval, in progress).
    async fn pending_tasks(&self) -> VaultResult<Vec<Task>>;

    /// Finished work (done and approved).
    async fn completed_tasks(&self) -> VaultResult<Vec<Task>>;

    /// Look up a task by id across all folders.
    async fn get_task(&self, id: &str) -> VaultResult<Task>;

    /// Write a new task into `Needs_Action`.
    async fn create_task(&self, task: NewTask) -> VaultResult<Task>;

    /// Approve or reject a task waiting in `Pending_Approval`.
    async fn decide(
        &self,
        id: &str,
        decision: Decision,
        note: Option<&str>,
    ) -> VaultResult<DecisionResult>;

    /// Counts for the dashboard.
    async fn dashboard_summary(&self) -> VaultResult<DashboardSummary>;

    /// Number of drafts waiting for approval.
    async fn drafts_count(&self) -> VaultResult<usize>;

    /// Most recent proactive suggestions (raw JSON documents).
    async fn suggestions(&self, limit: usize) -> VaultResult<Vec<Value>>;

    /// Skills listed in the skills index.
    async fn skills(&self) -> VaultResult<Vec<Skill>>;

    /// Latest financial export, or the zero placeholder.
    async fn financials(&self) -> VaultResult<FinancialSnapshot>;

    /// Latest social platform figures.
    async fn social_stats(&self) -> VaultResult<Vec<SocialStat>>;
}
