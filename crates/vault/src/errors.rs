//! Error types for vault operations.

use thiserror::Error;

use crate::entities::TaskStatus;

/// Errors raised by the vault store and domain facades.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No task file matched the identifier
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// A status change that would move a task away from its terminal direction
    #[error("Invalid status transition for task {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// Unknown priority label
    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    /// Failed to read a file
    #[error("Failed to read {path}: {reason}")]
    FileReadError { path: String, reason: String },

    /// Failed to write a file
    #[error("Failed to write {path}: {reason}")]
    FileWriteError { path: String, reason: String },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML frontmatter serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
