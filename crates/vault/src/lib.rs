#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]

//! # Vault
//!
//! The Digital FTE keeps its work as markdown files in a "vault" directory,
//! one folder per workflow stage. This crate provides:
//! - Task, skill and widget entities
//! - File-based vault storage behind the [`TaskStore`] trait
//! - Frontmatter parsing for task metadata
//! - The dashboard facade ([`TasksDomain`]) and board filtering
//! - The JSONL audit trail and chat history
//! - Keyword-routed chat ([`ChatRouter`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vault::{AuditLog, FileVault, TasksDomain};
//!
//! let store = FileVault::new("./Vault");
//! let domain = TasksDomain::new(Arc::new(store), AuditLog::in_vault("./Vault"));
//!
//! let board = domain.fetch_tasks().await?.filter("deploy");
//! ```

// Core entities
pub mod entities;

// Error types
pub mod errors;

// Storage layer
pub mod storage;

// Domain facades
pub mod domain;

pub mod audit;
pub mod chat;
pub mod frontmatter;
mod journal;
pub mod skills;

// Re-export key types for convenience
pub use audit::AuditLog;
pub use chat::{ChatLog, ChatReply, ChatRouter, Intent};
pub use domain::{TaskBoard, TaskForm, TasksDomain};
pub use entities::{
    ActivityItem, AgentStatus, AuditEntry, ChatRecord, ChatRole, DashboardSummary, Decision,
    FinancialSnapshot, Importance, NewTask, Priority, Skill, SkillCategory, SkillStatus,
    SocialStat, Task, TaskStatus, VaultFolder,
};
pub use errors::{VaultError, VaultResult};
pub use skills::group_by_category;
pub use storage::{DecisionResult, FileVault, TaskStore};
