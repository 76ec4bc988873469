//! REST client and approvals flow against a mocked backend.

use std::sync::Arc;

use async_trait::async_trait;
use companion::notice::drain_notices;
use companion::{
    ApiClient, ApprovalsController, ClientError, CompanionResult, ConnectivityMonitor,
    KeyValueStore, MemoryKeyValueStore, NoticeLevel, NoticeSink, OfflineQueue, Outcome, Signal,
};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn task_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "filename": format!("{id}.md"),
        "title": title,
        "content": format!("## {title}"),
        "description": "",
        "status": "pending",
        "folder": "Pending_Approval",
        "priority": "medium",
        "importance": "medium",
        "source": "email",
        "risk_score": 0.3,
        "complexity_score": 0.3,
        "timestamp": 1_700_000_000_000_i64,
        "created": "2026-01-01T00:00:00Z",
        "modified": "2026-01-01T00:00:00Z"
    })
}

async fn mount_pending(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/tasks/pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [task_json("T1", "Pay invoice"), task_json("T2", "Send post")],
            "count": 2
        })))
        .mount(server)
        .await;
}

type Fixture = (ApprovalsController, Arc<OfflineQueue>, UnboundedReceiver<Signal>);

async fn controller(server: &MockServer, online: bool) -> Fixture {
    let client = ApiClient::new(&server.uri()).unwrap();
    let queue = Arc::new(
        OfflineQueue::load(Arc::new(MemoryKeyValueStore::new()))
            .await
            .unwrap(),
    );
    let (sink, rx) = NoticeSink::channel();
    let controller = ApprovalsController::new(
        client,
        Arc::clone(&queue),
        ConnectivityMonitor::new(online),
        sink,
    );
    (controller, queue, rx)
}

#[tokio::test]
async fn test_typed_responses() {
    let server = MockServer::start().await;
    mount_pending(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pending_count": 4,
            "in_progress_count": 1,
            "done_today_count": 2,
            "urgent_count": 1,
            "last_updated": "2026-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/activity"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activities": [{
                "id": "2026-01-01T00:00:00Z",
                "type": "task.approved",
                "title": "Task Approved",
                "description": "Task T1 approved",
                "timestamp": "2026-01-01T00:00:00Z",
                "status": "approved"
            }]
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let summary = client.dashboard().await.unwrap();
    assert_eq!(summary.pending_count, 4);

    let pending = client.pending_tasks(20).await.unwrap();
    assert_eq!(pending.count, 2);
    assert_eq!(pending.tasks[0].title, "Pay invoice");

    let activity = client.activity(5).await.unwrap();
    assert_eq!(activity[0].kind, "task.approved");
}

#[tokio::test]
async fn test_base_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fte/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "components": {"api": "operational", "vault": true, "notifications": true},
            "timestamp": "2026-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&format!("{}/fte", server.uri())).unwrap();
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn test_status_error_keeps_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/NOPE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Task not found"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let err = client.task("NOPE").await.unwrap_err();
    match err {
        ClientError::Status { status, ref detail } => {
            assert_eq!(status, 404);
            assert_eq!(detail, "Task not found");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!err.is_network());
}

#[tokio::test]
async fn test_reject_posts_to_approve_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/T1/approve"))
        .and(body_json(json!({"approved": false, "note": "too risky"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "rejected", "message": "Task T1 rejected"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let response = client.reject_task("T1", Some("too risky")).await.unwrap();
    assert_eq!(response.status, "rejected");
}

#[tokio::test]
async fn test_online_approve_is_optimistic() {
    let server = MockServer::start().await;
    mount_pending(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/T1/approve"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "approved", "message": "Task T1 approved"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (controller, queue, mut rx) = controller(&server, true).await;
    controller.refresh().await.unwrap();

    let outcome = controller.approve("T1", None).await.unwrap();
    assert_eq!(outcome, Outcome::Applied);
    let remaining: Vec<_> = controller.pending().await.into_iter().map(|t| t.id).collect();
    assert_eq!(remaining, vec!["T2"]);
    assert!(queue.is_empty().await);

    let notices = drain_notices(&mut rx);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "Task approved successfully");
}

#[tokio::test]
async fn test_failed_approve_rolls_back() {
    let server = MockServer::start().await;
    mount_pending(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/T1/approve"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .mount(&server)
        .await;

    let (controller, _queue, mut rx) = controller(&server, true).await;
    controller.refresh().await.unwrap();

    assert!(controller.approve("T1", None).await.is_err());
    assert_eq!(controller.pending().await.len(), 2);

    let notices = drain_notices(&mut rx);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Failed to approve task. Please try again.");
}

#[tokio::test]
async fn test_offline_decision_is_queued_until_reconnect() {
    let server = MockServer::start().await;
    mount_pending(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/T2/approve"))
        .and(body_json(json!({"approved": false, "note": "later"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "rejected", "message": "Task T2 rejected"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let (controller, queue, mut rx) = controller(&server, false).await;
    controller.refresh().await.unwrap();

    let outcome = controller.reject("T2", Some("later")).await.unwrap();
    assert_eq!(outcome, Outcome::Queued);
    assert_eq!(controller.pending().await.len(), 1);
    assert_eq!(queue.len().await, 1);
    assert!(server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .all(|r| r.method.as_str() == "GET"));

    let notices = drain_notices(&mut rx);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(notices[0].message, "Action queued (Offline)");

    // Back online: the queued rejection is replayed once.
    let report = queue.drain(&client, &NoticeSink::discard()).await.unwrap();
    assert_eq!(report.synced, 1);
    assert!(queue.is_empty().await);
}

/// Loads as empty but cannot write.
struct ReadOnlyStore;

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn load(&self, _key: &str) -> CompanionResult<Option<String>> {
        Ok(None)
    }

    async fn save(&self, _key: &str, _value: &str) -> CompanionResult<()> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }
}

#[tokio::test]
async fn test_offline_queue_failure_restores_list() {
    let server = MockServer::start().await;
    mount_pending(&server).await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let queue = Arc::new(OfflineQueue::load(Arc::new(ReadOnlyStore)).await.unwrap());
    let (sink, mut rx) = NoticeSink::channel();
    let controller = ApprovalsController::new(
        client,
        Arc::clone(&queue),
        ConnectivityMonitor::new(false),
        sink,
    );
    controller.refresh().await.unwrap();

    assert!(controller.approve("T1", None).await.is_err());
    assert_eq!(controller.pending().await.len(), 2);
    assert!(queue.is_empty().await);

    let notices = drain_notices(&mut rx);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Failed to approve task. Please try again.");
}
