//! Audit trail stored as daily JSONL files.

use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDate};

use crate::entities::{ActivityItem, AuditEntry};
use crate::errors::VaultResult;
use crate::journal::{append_line, read_tail};

/// Reader/writer for `Logs/audit/audit_YYYY-MM-DD.jsonl`.
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Audit log inside a vault root.
    pub fn in_vault(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join("Logs").join("audit"))
    }

    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("audit_{}.jsonl", date.format("%Y-%m-%d")))
    }

    /// Append an entry to today's file.
    pub async fn record(&self, entry: &AuditEntry) -> VaultResult<()> {
        append_line(&self.file_for(Local::now().date_naive()), entry).await
    }

    /// Newest entries first, from today's file and then yesterday's.
    pub async fn recent_entries(&self, limit: usize) -> VaultResult<Vec<AuditEntry>> {
        let today = Local::now().date_naive();
        let mut entries = Vec::new();

        for date in [today, today - Duration::days(1)] {
            let mut day: Vec<AuditEntry> = read_tail(&self.file_for(date), limit).await?;
            day.reverse();
            entries.extend(day);
            if entries.len() >= limit {
                break;
            }
        }

        entries.truncate(limit);
        Ok(entries)
    }

    /// Recent entries shaped for the activity feed.
    pub async fn recent_activity(&self, limit: usize) -> VaultResult<Vec<ActivityItem>> {
        Ok(self
            .recent_entries(limit)
            .await?
            .iter()
            .map(ActivityItem::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    #[tokio::test]
    async fn test_record_and_read_newest_first() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::in_vault(dir.path());

        for i in 0..3 {
            log.record(&AuditEntry::new("task.created", "human", format!("t{i}")))
                .await
                .unwrap();
        }

        let entries = log.recent_entries(2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].resource, "t2");
        assert_eq!(entries[1].resource, "t1");
    }

    #[tokio::test]
    async fn test_falls_back_to_yesterday_and_skips_garbage() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::in_vault(dir.path());
        let yesterday = Local::now().date_naive() - Duration::days(1);
        let path = log.file_for(yesterday);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(
            &path,
            "{\"timestamp\":\"y1\",\"action\":\"email_sent\",\"actor\":\"watcher\"}\nnot json\n",
        )
        .await
        .unwrap();

        log.record(&AuditEntry::new("task.approved", "human", "t9"))
            .await
            .unwrap();

        let activity = log.recent_activity(10).await.unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].title, "Task Approved");
        assert_eq!(activity[1].title, "Email Sent");
    }
}
