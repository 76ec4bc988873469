//! File-based vault implementation.
//!
//! Layout under the vault root:
//!
//! ```text
//! Needs_Action/  Pending_Approval/  In_Progress/<role>/  Approved/  Rejected/  Done/
//! Logs/audit/audit_YYYY-MM-DD.jsonl   Logs/chat_history.jsonl
//! Suggestions/*.json   Accounting/financials.json   Social/stats.json
//! SKILLS-INDEX.md
//! ```

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::traits::{DecisionResult, TaskStore};
use crate::entities::{
    AgentStatus, DashboardSummary, Decision, FinancialSnapshot, NewTask, Skill, SocialStat, Task,
    TaskStatus, VaultFolder,
};
use crate::errors::{VaultError, VaultResult};
use crate::frontmatter::{declared_status, render_document, NewTaskFrontmatter};
use crate::skills::parse_skills_index;

const SKILLS_INDEX: &str = "SKILLS-INDEX.md";
const FINANCIALS_FILE: &str = "Accounting/financials.json";
const SOCIAL_FILE: &str = "Social/stats.json";
const SUGGESTIONS_DIR: &str = "Suggestions";

/// A task id names a file inside one folder and carries no path syntax.
fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\', '\0']) && !id.contains("..")
}

/// Vault stored as markdown files in workflow folders.
#[derive(Debug, Clone)]
pub struct FileVault {
    /// Vault root directory
    root: PathBuf,
}

impl FileVault {
    /// Create a vault rooted at `root`. Nothing is touched on disk until
    /// [`TaskStore::initialize`] or a write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the vault root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder_path(&self, folder: VaultFolder) -> PathBuf {
        self.root.join(folder.dir_name())
    }

    /// Directory holding the audit trail and chat history
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("Logs")
    }

    /// Markdown files in `dir` with their modification times. A missing
    /// directory reads as empty.
    async fn markdown_files(dir: &Path, recursive: bool) -> VaultResult<Vec<(PathBuf, SystemTime)>> {
        Self::files_with_extension(dir, "md", recursive).await
    }

    async fn files_with_extension(
        dir: &Path,
        extension: &str,
        recursive: bool,
    ) -> VaultResult<Vec<(PathBuf, SystemTime)>> {
        let mut found = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(VaultError::FileReadError {
                        path: current.display().to_string(),
                        reason: e.to_string(),
                    })
                }
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    if recursive {
                        pending.push(path);
                    }
                } else if path.extension().is_some_and(|ext| ext == extension) {
                    let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    found.push((path, modified));
                }
            }
        }

        // Newest first
        found.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(found)
    }

    async fn read_lossy(path: &Path) -> VaultResult<String> {
        let bytes = fs::read(path).await.map_err(|e| VaultError::FileReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn read_task(path: &Path, folder: VaultFolder) -> VaultResult<Task> {
        let content = Self::read_lossy(path).await?;
        let meta = fs::metadata(path).await?;
        let modified: DateTime<Utc> = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH).into();
        let created: DateTime<Utc> = meta.created().map(Into::into).unwrap_or(modified);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Task::from_markdown(&filename, folder, content, created, modified))
    }

    async fn load_folders(&self, folders: &[VaultFolder]) -> VaultResult<Vec<Task>> {
        let mut tasks = Vec::new();
        for folder in folders {
            let recursive = *folder == VaultFolder::InProgress;
            for (path, _) in Self::markdown_files(&self.folder_path(*folder), recursive).await? {
                tasks.push(Self::read_task(&path, *folder).await?);
            }
        }
        tasks.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(tasks)
    }

    /// Find a task file in one folder: exact stem first, then a name containing the id.
    /// Only files listed inside the folder can match.
    async fn find_in_folder(&self, folder: VaultFolder, id: &str) -> VaultResult<Option<PathBuf>> {
        if !is_plain_id(id) {
            debug!(task_id = %id, "Rejecting task id with path components");
            return Ok(None);
        }

        let recursive = folder == VaultFolder::InProgress;
        let files: Vec<PathBuf> = Self::markdown_files(&self.folder_path(folder), recursive)
            .await?
            .into_iter()
            .map(|(p, _)| p)
            .collect();

        if let Some(exact) = files
            .iter()
            .find(|p| p.file_stem().is_some_and(|stem| stem.to_string_lossy() == id))
        {
            return Ok(Some(exact.clone()));
        }
        Ok(files.into_iter().find(|p| {
            p.file_name()
                .is_some_and(|name| name.to_string_lossy().contains(id))
        }))
    }

    async fn read_json<T: DeserializeOwned>(&self, relative: &str) -> VaultResult<Option<T>> {
        let path = self.root.join(relative);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::FileReadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn move_file(from: &Path, to_dir: &Path) -> VaultResult<PathBuf> {
        fs::create_dir_all(to_dir).await?;
        let name = from.file_name().ok_or_else(|| VaultError::FileWriteError {
            path: from.display().to_string(),
            reason: "path has no file name".to_string(),
        })?;
        let dest = to_dir.join(name);
        fs::rename(from, &dest)
            .await
            .map_err(|e| VaultError::FileWriteError {
                path: dest.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(dest)
    }
}

#[async_trait]
impl TaskStore for FileVault {
    async fn initialize(&self) -> VaultResult<()> {
        for folder in VaultFolder::ALL {
            fs::create_dir_all(self.folder_path(folder)).await?;
        }
        fs::create_dir_all(self.logs_dir().join("audit")).await?;
        fs::create_dir_all(self.root.join(SUGGESTIONS_DIR)).await?;
        info!(root = %self.root.display(), "Vault initialized");
        Ok(())
    }

    async fn is_available(&self) -> bool {
        fs::try_exists(&self.root).await.unwrap_or(false)
    }

    async fn list_folder(&self, folder: VaultFolder, limit: usize) -> VaultResult<Vec<Task>> {
        let mut tasks = self.load_folders(&[folder]).await?;
        tasks.truncate(limit);
        Ok(tasks)
    }

    async fn pending_tasks(&self) -> VaultResult<Vec<Task>> {
        self.load_folders(&[
            VaultFolder::NeedsAction,
            VaultFolder::PendingApproval,
            VaultFolder::InProgress,
        ])
        .await
    }

    async fn completed_tasks(&self) -> VaultResult<Vec<Task>> {
        self.load_folders(&[VaultFolder::Done, VaultFolder::Approved])
            .await
    }

    async fn get_task(&self, id: &str) -> VaultResult<Task> {
        for folder in VaultFolder::SEARCH_ORDER {
            if let Some(path) = self.find_in_folder(folder, id).await? {
                return Self::read_task(&path, folder).await;
            }
        }
        Err(VaultError::TaskNotFound(id.to_string()))
    }

    async fn create_task(&self, task: NewTask) -> VaultResult<Task> {
        let dir = self.folder_path(VaultFolder::NeedsAction);
        fs::create_dir_all(&dir).await?;

        let now = Local::now();
        let front = NewTaskFrontmatter {
            kind: &task.source,
            priority: task.priority,
            created: now.to_rfc3339(),
            status: TaskStatus::Pending.as_str(),
            title: task.title.trim(),
        };
        let document = render_document(&front, &task.content)?;

        let base = format!("Task_{}", now.format("%Y-%m-%d_%H-%M-%S"));
        let mut attempt = 0u32;
        let path = loop {
            let name = if attempt == 0 {
                format!("{base}.md")
            } else {
                format!("{base}-{attempt}.md")
            };
            let candidate = dir.join(name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(mut file) => {
                    file.write_all(document.as_bytes()).await?;
                    file.flush().await?;
                    break candidate;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(VaultError::FileWriteError {
                        path: candidate.display().to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        };

        let created = Self::read_task(&path, VaultFolder::NeedsAction).await?;
        info!(task_id = %created.id, priority = %created.priority, "Task created");
        Ok(created)
    }

    async fn decide(
        &self,
        id: &str,
        decision: Decision,
        note: Option<&str>,
    ) -> VaultResult<DecisionResult> {
        let Some(path) = self.find_in_folder(VaultFolder::PendingApproval, id).await? else {
            return Err(VaultError::TaskNotFound(id.to_string()));
        };

        let mut content = Self::read_lossy(&path).await?;
        let current = declared_status(&content).unwrap_or(VaultFolder::PendingApproval.status());
        current.transition(id, decision.target_status())?;

        let moved_to = match decision {
            Decision::Approve => VaultFolder::Approved,
            Decision::Reject => {
                if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
                    content.push_str(&format!("\n\n---\n**Rejected:** {note}\n"));
                    fs::write(&path, content)
                        .await
                        .map_err(|e| VaultError::FileWriteError {
                            path: path.display().to_string(),
                            reason: e.to_string(),
                        })?;
                }
                VaultFolder::NeedsAction
            }
        };

        Self::move_file(&path, &self.folder_path(moved_to)).await?;
        info!(task_id = %id, decision = ?decision, moved_to = %moved_to, "Task decided");

        Ok(DecisionResult {
            task_id: id.to_string(),
            decision,
            moved_to,
        })
    }

    async fn dashboard_summary(&self) -> VaultResult<DashboardSummary> {
        let needs_action = Self::markdown_files(&self.folder_path(VaultFolder::NeedsAction), false).await?;
        let pending_approval =
            Self::markdown_files(&self.folder_path(VaultFolder::PendingApproval), false).await?;
        let in_progress = Self::markdown_files(&self.folder_path(VaultFolder::InProgress), true).await?;
        let done = Self::markdown_files(&self.folder_path(VaultFolder::Done), false).await?;

        let today = Local::now().format("%Y-%m-%d").to_string();
        let done_today = done
            .iter()
            .filter(|(p, _)| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().contains(&today))
            })
            .count();

        let mut urgent = 0;
        for (path, _) in &needs_action {
            let content = Self::read_lossy(path).await?.to_lowercase();
            if content.contains("urgent") || content.contains("priority: high") {
                urgent += 1;
            }
        }

        Ok(DashboardSummary {
            pending_count: needs_action.len() + pending_approval.len(),
            in_progress_count: in_progress.len(),
            done_today_count: done_today,
            urgent_count: urgent,
            agent_status: AgentStatus::Online,
            last_updated: Utc::now(),
        })
    }

    async fn drafts_count(&self) -> VaultResult<usize> {
        Ok(
            Self::markdown_files(&self.folder_path(VaultFolder::PendingApproval), false)
                .await?
                .len(),
        )
    }

    async fn suggestions(&self, limit: usize) -> VaultResult<Vec<Value>> {
        let files = Self::files_with_extension(&self.root.join(SUGGESTIONS_DIR), "json", false).await?;
        let mut suggestions = Vec::new();
        for (path, _) in files.into_iter().take(limit) {
            let content = Self::read_lossy(&path).await?;
            match serde_json::from_str::<Value>(&content) {
                Ok(value) => suggestions.push(value),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping invalid suggestion"),
            }
        }
        Ok(suggestions)
    }

    async fn skills(&self) -> VaultResult<Vec<Skill>> {
        let path = self.root.join(SKILLS_INDEX);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(parse_skills_index(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No skills index found");
                Ok(Vec::new())
            }
            Err(e) => Err(VaultError::FileReadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn financials(&self) -> VaultResult<FinancialSnapshot> {
        Ok(self
            .read_json::<FinancialSnapshot>(FINANCIALS_FILE)
            .await?
            .map(|snapshot| FinancialSnapshot {
                live: true,
                ..snapshot
            })
            .unwrap_or_default())
    }

    async fn social_stats(&self) -> VaultResult<Vec<SocialStat>> {
        Ok(self
            .read_json::<Vec<SocialStat>>(SOCIAL_FILE)
            .await?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn vault() -> (TempDir, FileVault) {
        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path());
        vault.initialize().await.unwrap();
        (dir, vault)
    }

    async fn write(vault: &FileVault, folder: VaultFolder, name: &str, content: &str) {
        fs::write(vault.folder_path(folder).join(name), content)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_vault_reads_empty() {
        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path().join("absent"));
        assert!(!vault.is_available().await);
        assert!(vault.pending_tasks().await.unwrap().is_empty());
        assert!(vault.skills().await.unwrap().is_empty());
        assert!(!vault.financials().await.unwrap().live);
        assert_eq!(vault.drafts_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_task_writes_needs_action() {
        let (_dir, vault) = vault().await;
        let first = vault
            .create_task(NewTask::new("Deploy", "deploy service", Default::default()))
            .await
            .unwrap();
        let second = vault
            .create_task(NewTask::new("Report", "write report", Default::default()))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.folder, VaultFolder::NeedsAction);
        assert_eq!(first.title, "Deploy");
        assert_eq!(first.source, "manual_task");
        assert_eq!(vault.pending_tasks().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_task_searches_subfolders() {
        let (_dir, vault) = vault().await;
        let role_dir = vault.folder_path(VaultFolder::InProgress).join("finance");
        fs::create_dir_all(&role_dir).await.unwrap();
        fs::write(role_dir.join("INVOICE_7.md"), "## Invoice seven")
            .await
            .unwrap();

        let task = vault.get_task("INVOICE_7").await.unwrap();
        assert_eq!(task.folder, VaultFolder::InProgress);
        assert_eq!(task.title, "Invoice seven");

        assert!(matches!(
            vault.get_task("missing").await,
            Err(VaultError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_approve_moves_to_approved() {
        let (_dir, vault) = vault().await;
        write(&vault, VaultFolder::PendingApproval, "EMAIL_1.md", "reply to client").await;

        let result = vault.decide("EMAIL_1", Decision::Approve, None).await.unwrap();
        assert_eq!(result.moved_to, VaultFolder::Approved);

        let task = vault.get_task("EMAIL_1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Approved);
        assert_eq!(vault.drafts_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reject_appends_note_and_returns_to_needs_action() {
        let (_dir, vault) = vault().await;
        write(&vault, VaultFolder::PendingApproval, "POST_3.md", "linkedin draft").await;

        vault
            .decide("POST_3", Decision::Reject, Some("tone is off"))
            .await
            .unwrap();

        let task = vault.get_task("POST_3").await.unwrap();
        assert_eq!(task.folder, VaultFolder::NeedsAction);
        assert!(task.content.ends_with("---\n**Rejected:** tone is off\n"));
    }

    #[tokio::test]
    async fn test_decide_requires_pending_approval() {
        let (_dir, vault) = vault().await;
        write(&vault, VaultFolder::Done, "OLD_1.md", "finished").await;

        let err = vault.decide("OLD_1", Decision::Approve, None).await.unwrap_err();
        assert!(matches!(err, VaultError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_ids_with_path_components_never_match() {
        let (dir, vault) = vault().await;
        write(&vault, VaultFolder::Done, "finished.md", "shipped").await;
        fs::write(dir.path().join("outside.md"), "not a task").await.unwrap();

        for id in ["../Done/finished", "..\\Done\\finished", "../outside", "..", "", "a\0b"] {
            assert!(matches!(
                vault.decide(id, Decision::Approve, None).await,
                Err(VaultError::TaskNotFound(_))
            ));
            assert!(matches!(
                vault.get_task(id).await,
                Err(VaultError::TaskNotFound(_))
            ));
        }
        assert!(vault.folder_path(VaultFolder::Done).join("finished.md").exists());
        assert!(!vault.folder_path(VaultFolder::Approved).join("finished.md").exists());
    }

    #[tokio::test]
    async fn test_declared_terminal_status_blocks_decision() {
        let (_dir, vault) = vault().await;
        write(
            &vault,
            VaultFolder::PendingApproval,
            "STALE_1.md",
            "---\nstatus: rejected\n---\nalready handled",
        )
        .await;

        let err = vault.decide("STALE_1", Decision::Approve, None).await.unwrap_err();
        assert!(matches!(err, VaultError::InvalidTransition { .. }));
        assert!(vault
            .folder_path(VaultFolder::PendingApproval)
            .join("STALE_1.md")
            .exists());
    }

    #[tokio::test]
    async fn test_dashboard_summary_counts() {
        let (_dir, vault) = vault().await;
        write(&vault, VaultFolder::NeedsAction, "A.md", "URGENT: call bank").await;
        write(&vault, VaultFolder::NeedsAction, "B.md", "---\npriority: high\n---\nx").await;
        write(&vault, VaultFolder::NeedsAction, "C.md", "routine").await;
        write(&vault, VaultFolder::PendingApproval, "D.md", "draft").await;
        let today = Local::now().format("%Y-%m-%d").to_string();
        write(&vault, VaultFolder::Done, &format!("Task_{today}.md"), "done").await;
        write(&vault, VaultFolder::Done, "Task_2001-01-01.md", "old").await;

        let summary = vault.dashboard_summary().await.unwrap();
        assert_eq!(summary.pending_count, 4);
        assert_eq!(summary.urgent_count, 2);
        assert_eq!(summary.done_today_count, 1);
        assert_eq!(summary.in_progress_count, 0);
    }

    #[tokio::test]
    async fn test_widget_files() {
        let (dir, vault) = vault().await;
        fs::create_dir_all(dir.path().join("Accounting")).await.unwrap();
        fs::write(
            dir.path().join(FINANCIALS_FILE),
            r#"{"revenue": 1200.5, "expenses": 200.0, "profit": 1000.5, "margin": 83.3}"#,
        )
        .await
        .unwrap();
        fs::write(vault.root().join(SUGGESTIONS_DIR).join("s1.json"), r#"{"title":"Follow up"}"#)
            .await
            .unwrap();
        fs::write(vault.root().join(SUGGESTIONS_DIR).join("bad.json"), "{nope")
            .await
            .unwrap();

        let fin = vault.financials().await.unwrap();
        assert!(fin.live);
        assert!((fin.revenue - 1200.5).abs() < f64::EPSILON);

        let suggestions = vault.suggestions(10).await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0]["title"], "Follow up");
    }
}
