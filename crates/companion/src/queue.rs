//! Offline action queue.
//!
//! Approvals and rejections made while offline are persisted here and
//! replayed in FIFO order once connectivity returns. Each action gets at most
//! [`MAX_RETRIES`] failed attempts before it is dropped with an error notice.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::{ClientError, CompanionResult};
use crate::notice::{NoticeSink, View};
use crate::persist::{load_state, save_state, KeyValueStore, OFFLINE_QUEUE_KEY};

/// Failed attempts allowed before an action is dropped.
pub const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Approve,
    Reject,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A mutation attempted while offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineAction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActionType,
    pub payload: ActionPayload,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub retry_count: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueState {
    #[serde(default)]
    queue: Vec<OfflineAction>,
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub synced: usize,
    pub retried: usize,
    pub dropped: usize,
    /// Another drain was already running
    pub skipped: bool,
}

impl DrainReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Replays a queued action against the backend.
#[async_trait]
pub trait ActionSender: Send + Sync {
    async fn send(&self, action: &OfflineAction) -> Result<(), ClientError>;
}

#[async_trait]
impl ActionSender for ApiClient {
    async fn send(&self, action: &OfflineAction) -> Result<(), ClientError> {
        let note = action.payload.note.as_deref();
        match action.kind {
            ActionType::Approve => self.approve_task(&action.payload.task_id, note).await?,
            ActionType::Reject => self.reject_task(&action.payload.task_id, note).await?,
        };
        Ok(())
    }
}

/// Persisted FIFO of offline actions.
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    actions: Mutex<Vec<OfflineAction>>,
    drain_lock: Mutex<()>,
}

impl OfflineQueue {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> CompanionResult<Self> {
        let state: QueueState = load_state(store.as_ref(), OFFLINE_QUEUE_KEY)
            .await?
            .unwrap_or_default();
        debug!(count = state.queue.len(), "Offline queue loaded");
        Ok(Self {
            store,
            actions: Mutex::new(state.queue),
            drain_lock: Mutex::new(()),
        })
    }

    async fn persist(&self, actions: &[OfflineAction]) -> CompanionResult<()> {
        save_state(
            self.store.as_ref(),
            OFFLINE_QUEUE_KEY,
            &QueueState {
                queue: actions.to_vec(),
            },
        )
        .await
    }

    /// Append an action with a fresh id, the current time and no retries.
    pub async fn add(
        &self,
        kind: ActionType,
        task_id: &str,
        note: Option<&str>,
    ) -> CompanionResult<OfflineAction> {
        let action = OfflineAction {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            payload: ActionPayload {
                task_id: task_id.to_string(),
                note: note.map(ToString::to_string),
            },
            timestamp: Utc::now().timestamp_millis(),
            retry_count: 0,
        };
        let mut actions = self.actions.lock().await;
        actions.push(action.clone());
        if let Err(e) = self.persist(&actions).await {
            actions.pop();
            return Err(e);
        }
        info!(task_id, kind = %kind, "Action queued for sync");
        Ok(action)
    }

    pub async fn remove(&self, id: &str) -> CompanionResult<()> {
        let mut actions = self.actions.lock().await;
        actions.retain(|a| a.id != id);
        self.persist(&actions).await
    }

    /// Bump the retry count. `None` when the action is no longer queued.
    pub async fn increment_retry(&self, id: &str) -> CompanionResult<Option<u32>> {
        let mut actions = self.actions.lock().await;
        let Some(action) = actions.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        action.retry_count += 1;
        let count = action.retry_count;
        self.persist(&actions).await?;
        Ok(Some(count))
    }

    pub async fn clear(&self) -> CompanionResult<()> {
        let mut actions = self.actions.lock().await;
        actions.clear();
        self.persist(&actions).await
    }

    pub async fn snapshot(&self) -> Vec<OfflineAction> {
        self.actions.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.actions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Replay queued actions once, oldest first.
    ///
    /// Only one drain runs at a time; a concurrent call returns
    /// [`DrainReport::skipped`] without touching the queue.
    pub async fn drain(
        &self,
        sender: &dyn ActionSender,
        notices: &NoticeSink,
    ) -> CompanionResult<DrainReport> {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            debug!("Drain already in progress");
            return Ok(DrainReport::skipped());
        };

        let mut report = DrainReport::default();
        for action in self.snapshot().await {
            let task_id = &action.payload.task_id;
            match sender.send(&action).await {
                Ok(()) => {
                    self.remove(&action.id).await?;
                    report.synced += 1;
                    info!(task_id = %task_id, kind = %action.kind, "Offline action synced");
                }
                Err(e) => {
                    warn!(task_id = %task_id, error = %e, "Failed to replay offline action");
                    match self.increment_retry(&action.id).await? {
                        Some(count) if count >= MAX_RETRIES => {
                            self.remove(&action.id).await?;
                            report.dropped += 1;
                            notices.error(format!(
                                "Failed to sync action for task {task_id} after {MAX_RETRIES} attempts"
                            ));
                        }
                        Some(_) => report.retried += 1,
                        None => {}
                    }
                }
            }
        }

        if report.synced > 0 {
            notices.success("Offline actions synced");
            notices.invalidate(View::Approvals);
            notices.invalidate(View::Dashboard);
        }
        Ok(report)
    }
}

/// Online/offline state shared between the app and the sync task.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                info!(online, "Connectivity changed");
                *current = online;
                true
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Probe the backend health endpoint and record the result.
    pub async fn probe(&self, client: &ApiClient) -> bool {
        let online = match client.health().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Health probe failed");
                !e.is_network()
            }
        };
        self.set_online(online);
        online
    }
}

/// Drain the queue now if online, then on every offline to online flip.
pub fn spawn_sync_on_reconnect(
    queue: Arc<OfflineQueue>,
    sender: Arc<dyn ActionSender>,
    monitor: &ConnectivityMonitor,
    notices: NoticeSink,
) -> JoinHandle<()> {
    let mut rx = monitor.subscribe();
    tokio::spawn(async move {
        let mut was_online = *rx.borrow_and_update();
        if was_online {
            run_drain(&queue, sender.as_ref(), &notices).await;
        }
        while rx.changed().await.is_ok() {
            let online = *rx.borrow_and_update();
            if online && !was_online && !queue.is_empty().await {
                run_drain(&queue, sender.as_ref(), &notices).await;
            }
            was_online = online;
        }
    })
}

async fn run_drain(queue: &OfflineQueue, sender: &dyn ActionSender, notices: &NoticeSink) {
    match queue.drain(sender, notices).await {
        Ok(report) => debug!(?report, "Reconnect drain finished"),
        Err(e) => warn!(error = %e, "Reconnect drain failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::{drain_notices, NoticeLevel};
    use crate::persist::MemoryKeyValueStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sender that fails every call and counts attempts.
    #[derive(Default)]
    struct Failing {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ActionSender for Failing {
        async fn send(&self, _action: &OfflineAction) -> Result<(), ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Status {
                status: 503,
                detail: "unavailable".into(),
            })
        }
    }

    #[derive(Default)]
    struct Recording {
        sent: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ActionSender for Recording {
        async fn send(&self, action: &OfflineAction) -> Result<(), ClientError> {
            self.sent.lock().unwrap().push(action.payload.task_id.clone());
            Ok(())
        }
    }

    async fn queue() -> OfflineQueue {
        OfflineQueue::load(Arc::new(MemoryKeyValueStore::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_assigns_id_and_zero_retries() {
        let queue = queue().await;
        let a = queue.add(ActionType::Approve, "t1", None).await.unwrap();
        let b = queue.add(ActionType::Reject, "t2", Some("no")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.retry_count, 0);
        assert_eq!(queue.len().await, 2);

        assert_eq!(queue.increment_retry(&a.id).await.unwrap(), Some(1));
        assert_eq!(queue.increment_retry("missing").await.unwrap(), None);
        queue.remove(&a.id).await.unwrap();
        assert_eq!(queue.snapshot().await, vec![b]);
        queue.clear().await.unwrap();
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_persisted_blob_uses_app_field_names() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let queue = OfflineQueue::load(Arc::clone(&kv)).await.unwrap();
        queue.add(ActionType::Approve, "t1", Some("ok")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&kv.load(OFFLINE_QUEUE_KEY).await.unwrap().unwrap()).unwrap();
        let action = &raw["state"]["queue"][0];
        assert_eq!(action["type"], "approve");
        assert_eq!(action["payload"]["taskId"], "t1");
        assert_eq!(action["payload"]["note"], "ok");
        assert_eq!(action["retryCount"], 0);

        let reloaded = OfflineQueue::load(kv).await.unwrap();
        assert_eq!(reloaded.len().await, 1);
    }

    #[tokio::test]
    async fn test_success_removes_and_notifies() {
        let queue = queue().await;
        queue.add(ActionType::Approve, "t1", None).await.unwrap();
        queue.add(ActionType::Reject, "t2", None).await.unwrap();
        let (sink, mut rx) = NoticeSink::channel();
        let sender = Recording::default();

        let report = queue.drain(&sender, &sink).await.unwrap();
        assert_eq!(report.synced, 2);
        assert!(queue.is_empty().await);
        assert_eq!(*sender.sent.lock().unwrap(), vec!["t1", "t2"]);

        let notices = drain_notices(&mut rx);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[0].message, "Offline actions synced");
    }

    #[tokio::test]
    async fn test_three_failures_drop_the_action() {
        let queue = queue().await;
        queue.add(ActionType::Approve, "t1", None).await.unwrap();
        let (sink, mut rx) = NoticeSink::channel();
        let sender = Failing::default();

        let first = queue.drain(&sender, &sink).await.unwrap();
        assert_eq!(first.retried, 1);
        assert_eq!(queue.snapshot().await[0].retry_count, 1);

        queue.drain(&sender, &sink).await.unwrap();
        assert_eq!(queue.len().await, 1);

        let third = queue.drain(&sender, &sink).await.unwrap();
        assert_eq!(third.dropped, 1);
        assert!(queue.is_empty().await);
        assert_eq!(sender.calls.load(Ordering::SeqCst), 3);

        let notices = drain_notices(&mut rx);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(
            notices[0].message,
            "Failed to sync action for task t1 after 3 attempts"
        );
    }

    #[tokio::test]
    async fn test_concurrent_drain_is_skipped() {
        let queue = queue().await;
        queue.add(ActionType::Approve, "t1", None).await.unwrap();
        let sender = Recording::default();

        let guard = queue.drain_lock.lock().await;
        let report = queue.drain(&sender, &NoticeSink::discard()).await.unwrap();
        assert!(report.skipped);
        assert!(sender.sent.lock().unwrap().is_empty());
        drop(guard);

        let report = queue.drain(&sender, &NoticeSink::discard()).await.unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_triggers_drain() {
        let queue = Arc::new(queue().await);
        queue.add(ActionType::Approve, "t1", None).await.unwrap();
        let sender = Arc::new(Recording::default());
        let monitor = ConnectivityMonitor::new(false);

        let handle = spawn_sync_on_reconnect(
            Arc::clone(&queue),
            sender.clone(),
            &monitor,
            NoticeSink::discard(),
        );

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(queue.len().await, 1, "nothing is sent while offline");

        monitor.set_online(true);
        for _ in 0..50 {
            if queue.is_empty().await {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(queue.is_empty().await);
        assert_eq!(*sender.sent.lock().unwrap(), vec!["t1"]);
        handle.abort();
    }
}
