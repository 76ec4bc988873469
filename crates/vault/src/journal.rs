//! Append-only JSONL files shared by the audit trail and chat history.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::{VaultError, VaultResult};

/// Append one record as a JSON line, creating parent directories.
pub(crate) async fn append_line<T: Serialize>(path: &Path, record: &T) -> VaultResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| VaultError::FileWriteError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// The last `limit` parseable records of a JSONL file, in file order.
/// Malformed lines are skipped; a missing file reads as empty.
pub(crate) async fn read_tail<T: DeserializeOwned>(path: &Path, limit: usize) -> VaultResult<Vec<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(VaultError::FileReadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };
    let content = String::from_utf8_lossy(&bytes);

    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(limit);

    let mut records = Vec::with_capacity(lines.len() - start);
    for line in &lines[start..] {
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping malformed line"),
        }
    }
    Ok(records)
}
