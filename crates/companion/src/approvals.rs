//! Pending approvals with optimistic updates and offline queueing.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use vault::Task;

use crate::client::ApiClient;
use crate::error::CompanionResult;
use crate::notice::{NoticeSink, View};
use crate::queue::{ActionType, ConnectivityMonitor, OfflineQueue};

const PENDING_LIMIT: usize = 50;

/// How a decision was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Sent to the backend
    Applied,
    /// Stored for replay once back online
    Queued,
}

/// Cached list of tasks waiting for a decision.
pub struct ApprovalsController {
    client: ApiClient,
    queue: Arc<OfflineQueue>,
    connectivity: ConnectivityMonitor,
    notices: NoticeSink,
    pending: RwLock<Vec<Task>>,
}

impl ApprovalsController {
    pub fn new(
        client: ApiClient,
        queue: Arc<OfflineQueue>,
        connectivity: ConnectivityMonitor,
        notices: NoticeSink,
    ) -> Self {
        Self {
            client,
            queue,
            connectivity,
            notices,
            pending: RwLock::new(Vec::new()),
        }
    }

    /// Reload pending approvals from the backend.
    pub async fn refresh(&self) -> CompanionResult<Vec<Task>> {
        let list = self.client.pending_tasks(PENDING_LIMIT).await?;
        *self.pending.write().await = list.tasks.clone();
        Ok(list.tasks)
    }

    pub async fn pending(&self) -> Vec<Task> {
        self.pending.read().await.clone()
    }

    pub async fn approve(&self, task_id: &str, note: Option<&str>) -> CompanionResult<Outcome> {
        self.decide(ActionType::Approve, task_id, note).await
    }

    pub async fn reject(&self, task_id: &str, note: Option<&str>) -> CompanionResult<Outcome> {
        self.decide(ActionType::Reject, task_id, note).await
    }

    async fn decide(
        &self,
        kind: ActionType,
        task_id: &str,
        note: Option<&str>,
    ) -> CompanionResult<Outcome> {
        let previous = {
            let mut pending = self.pending.write().await;
            let previous = pending.clone();
            pending.retain(|t| t.id != task_id);
            previous
        };

        if !self.connectivity.is_online() {
            if let Err(e) = self.queue.add(kind, task_id, note).await {
                warn!(task_id, error = %e, "Could not queue decision, restoring list");
                *self.pending.write().await = previous;
                self.notices
                    .error(format!("Failed to {kind} task. Please try again."));
                return Err(e);
            }
            self.notices.info("Action queued (Offline)");
            return Ok(Outcome::Queued);
        }

        let result = match kind {
            ActionType::Approve => self.client.approve_task(task_id, note).await,
            ActionType::Reject => self.client.reject_task(task_id, note).await,
        };

        match result {
            Ok(response) => {
                info!(task_id, status = %response.status, "Decision applied");
                match kind {
                    ActionType::Approve => self.notices.success("Task approved successfully"),
                    ActionType::Reject => self.notices.info("Task rejected"),
                }
                self.notices.invalidate(View::Dashboard);
                self.notices.invalidate(View::Approvals);
                Ok(Outcome::Applied)
            }
            Err(e) => {
                warn!(task_id, error = %e, "Decision failed, restoring list");
                *self.pending.write().await = previous;
                self.notices
                    .error(format!("Failed to {kind} task. Please try again."));
                Err(e.into())
            }
        }
    }
}
