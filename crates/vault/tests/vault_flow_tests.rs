//! End-to-end flows over a real vault directory.

use std::sync::Arc;

use tempfile::TempDir;
use vault::{
    AuditLog, FileVault, TaskForm, TaskStore, TasksDomain, VaultError, VaultFolder,
};

async fn setup() -> (TempDir, Arc<FileVault>, TasksDomain) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileVault::new(dir.path()));
    store.initialize().await.unwrap();
    let domain = TasksDomain::new(store.clone(), AuditLog::in_vault(dir.path()));
    (dir, store, domain)
}

async fn seed_pending(dir: &TempDir, name: &str, body: &str) {
    tokio::fs::write(dir.path().join("Pending_Approval").join(name), body)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_approval_moves_file_and_audits() {
    let (dir, store, domain) = setup().await;
    seed_pending(&dir, "EMAIL_invoice.md", "---\ntype: email\n---\n## Pay the invoice\n").await;

    let result = domain.approve("EMAIL_invoice", None).await.unwrap();
    assert_eq!(result.moved_to, VaultFolder::Approved);
    assert!(dir.path().join("Approved").join("EMAIL_invoice.md").exists());

    let task = store.get_task("EMAIL_invoice").await.unwrap();
    assert_eq!(task.folder, VaultFolder::Approved);
    assert_eq!(task.title, "Pay the invoice");

    let logs = domain.fetch_logs(10).await.unwrap();
    assert_eq!(logs[0].action, "task.approved");
    assert_eq!(logs[0].resource, "EMAIL_invoice");

    // Already decided: no longer waiting for approval.
    let err = domain.approve("EMAIL_invoice", None).await.unwrap_err();
    assert!(matches!(err, VaultError::TaskNotFound(_)));
}

#[tokio::test]
async fn test_rejection_returns_task_with_note() {
    let (dir, store, domain) = setup().await;
    seed_pending(&dir, "POST_launch.md", "## Launch post\n").await;

    let result = domain
        .reject("POST_launch", Some("tone is off"))
        .await
        .unwrap();
    assert_eq!(result.moved_to, VaultFolder::NeedsAction);

    let task = store.get_task("POST_launch").await.unwrap();
    assert_eq!(task.folder, VaultFolder::NeedsAction);
    assert!(task.content.contains("**Rejected:** tone is off"));
}

#[tokio::test]
async fn test_submitted_task_lands_on_board() {
    let (_dir, _store, domain) = setup().await;

    let created = domain
        .submit_task(TaskForm {
            title: "Renew domain".into(),
            content: "Before the end of the month".into(),
            priority: Some("high".into()),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.folder, VaultFolder::NeedsAction);

    let ignored = domain
        .submit_task(TaskForm {
            title: "   ".into(),
            ..TaskForm::default()
        })
        .await
        .unwrap();
    assert!(ignored.is_none());

    let board = domain.fetch_tasks().await.unwrap();
    assert_eq!(board.pending.len(), 1);
    assert!(board.completed.is_empty());
    assert_eq!(board.filter("end of the MONTH").total(), 1);
    assert!(board.filter("payroll").is_empty());

    let logs = domain.fetch_logs(10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "task.created");
}
