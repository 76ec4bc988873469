//! Keyword-routed chat with the agent.
//!
//! Messages are matched against a fixed intent table; anything unmatched
//! gets the fallback reply with suggested follow-ups.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{ChatRecord, ChatRole, NewTask, Priority};
use crate::errors::VaultResult;
use crate::journal::{append_line, read_tail};
use crate::storage::TaskStore;

static CREATE_TASK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(create|new|add)\s+task\s*:?\s*").unwrap());

const PENDING_PREVIEW: usize = 5;

/// Reply returned to the chat screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub action_taken: Option<String>,
    pub task_created: Option<String>,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// What the user is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Status,
    Pending,
    Urgent,
    Help,
    Schedule,
    LinkedIn,
    Email,
    CreateTask(String),
    Fallback,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Classify a message. Order matters: earlier intents win.
pub fn classify(message: &str) -> Intent {
    let lower = message.to_lowercase();

    if contains_any(&lower, &["status", "how are you", "system status"]) {
        Intent::Status
    } else if contains_any(&lower, &["pending", "approvals", "what needs approval"]) {
        Intent::Pending
    } else if contains_any(&lower, &["urgent", "critical", "important"]) {
        Intent::Urgent
    } else if contains_any(&lower, &["help", "what can you do", "capabilities"]) {
        Intent::Help
    } else if contains_any(&lower, &["schedule", "remind"]) {
        Intent::Schedule
    } else if lower.contains("linkedin") {
        Intent::LinkedIn
    } else if lower.contains("email") {
        Intent::Email
    } else if contains_any(&lower, &["create task", "new task", "add task"]) {
        let description = CREATE_TASK_PREFIX.replace_all(message, "").trim().to_string();
        Intent::CreateTask(description)
    } else {
        Intent::Fallback
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Chat history stored in `Logs/chat_history.jsonl`.
#[derive(Debug, Clone)]
pub struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn in_vault(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join("Logs").join("chat_history.jsonl"))
    }

    pub async fn append(&self, record: &ChatRecord) -> VaultResult<()> {
        append_line(&self.path, record).await
    }

    /// The last `limit` messages in conversation order.
    pub async fn history(&self, limit: usize) -> VaultResult<Vec<ChatRecord>> {
        read_tail(&self.path, limit).await
    }
}

/// Answers chat messages using the task store.
pub struct ChatRouter {
    store: Arc<dyn TaskStore>,
    log: ChatLog,
}

impl ChatRouter {
    pub fn new(store: Arc<dyn TaskStore>, log: ChatLog) -> Self {
        Self { store, log }
    }

    /// Answer a message and record both sides in the history.
    pub async fn respond(&self, message: &str) -> VaultResult<ChatReply> {
        let message = message.trim();
        self.log
            .append(&ChatRecord {
                role: ChatRole::User,
                content: message.to_string(),
                timestamp: Utc::now(),
                suggestions: Vec::new(),
            })
            .await?;

        let intent = classify(message);
        info!(intent = ?intent, "Chat message routed");
        let reply = self.reply_for(intent, message).await?;

        self.log
            .append(&ChatRecord {
                role: ChatRole::Agent,
                content: reply.response.clone(),
                timestamp: reply.timestamp,
                suggestions: reply.suggestions.clone(),
            })
            .await?;

        Ok(reply)
    }

    pub async fn history(&self, limit: usize) -> VaultResult<Vec<ChatRecord>> {
        self.log.history(limit).await
    }

    async fn reply_for(&self, intent: Intent, message: &str) -> VaultResult<ChatReply> {
        let mut action_taken = None;
        let mut task_created = None;

        let (response, suggestions) = match intent {
            Intent::Status => {
                let summary = self.store.dashboard_summary().await?;
                (
                    format!(
                        "System is running smoothly.\n\n**Current Status:**\n\
                         - Pending approvals: {}\n- In progress: {}\n\
                         - Completed today: {}\n- Urgent items: {}",
                        summary.pending_count,
                        summary.in_progress_count,
                        summary.done_today_count,
                        summary.urgent_count
                    ),
                    strings(&["Show pending approvals", "What's urgent?", "Today's summary"]),
                )
            }
            Intent::Pending => {
                let pending = self
                    .store
                    .list_folder(crate::entities::VaultFolder::PendingApproval, usize::MAX)
                    .await?;
                let response = if pending.is_empty() {
                    "Great news! No items pending approval right now.".to_string()
                } else {
                    let list = pending
                        .iter()
                        .take(PENDING_PREVIEW)
                        .map(|t| format!("- **{}** ({})", t.title, t.priority))
                        .collect::<Vec<_>>()
                        .join("\n");
                    format!(
                        "You have {} items waiting for approval:\n\n{list}",
                        pending.len()
                    )
                };
                (
                    response,
                    strings(&["Approve all low-risk", "Show details", "Refresh"]),
                )
            }
            Intent::Urgent => {
                let summary = self.store.dashboard_summary().await?;
                let response = if summary.urgent_count > 0 {
                    format!(
                        "You have {} urgent items that need attention. Check the Approvals tab for details.",
                        summary.urgent_count
                    )
                } else {
                    "No urgent items at the moment. Everything is under control!".to_string()
                };
                (response, strings(&["Show all tasks", "Status update"]))
            }
            Intent::Help => (
                "I'm your Digital FTE assistant. Here's what I can help with:\n\n\
                 **Task Management:**\n- Check pending approvals\n- Review urgent items\n- Get status updates\n\n\
                 **Automation:**\n- Draft emails and social posts\n- Schedule LinkedIn content\n- Monitor Gmail for important messages\n\n\
                 **Business:**\n- Weekly CEO briefings\n- Transaction tracking (Odoo)\n- Performance reports"
                    .to_string(),
                strings(&["Check status", "Pending approvals", "Today's summary"]),
            ),
            Intent::Schedule => {
                action_taken = Some("awaiting_details".to_string());
                (
                    "I can help you schedule tasks! To create a scheduled task, please provide:\n\n\
                     1. What needs to be done\n2. When it should happen\n\n\
                     For example: 'Schedule a LinkedIn post about our product launch for tomorrow at 9am'"
                        .to_string(),
                    strings(&["Schedule LinkedIn post", "Remind me tomorrow", "Set weekly reminder"]),
                )
            }
            Intent::LinkedIn => (
                "I can help with LinkedIn! What would you like to do?\n\n\
                 - Draft a new post\n- Schedule content for later\n- Check engagement on recent posts"
                    .to_string(),
                strings(&["Draft a post", "Schedule for tomorrow", "Check analytics"]),
            ),
            Intent::Email => (
                "Email assistance available! I can:\n\n\
                 - Draft reply to recent emails\n- Summarize inbox\n- Flag important messages\n\n\
                 What would you like me to do?"
                    .to_string(),
                strings(&["Check inbox", "Draft reply", "Summarize unread"]),
            ),
            Intent::CreateTask(description) => {
                let response = if description.is_empty() {
                    "What task would you like me to create? Please describe what needs to be done."
                        .to_string()
                } else {
                    let task = self
                        .store
                        .create_task(NewTask::new(
                            description.clone(),
                            "Created via mobile app chat.\n\n## Actions\n- [ ] Review and process",
                            Priority::Medium,
                        ))
                        .await?;
                    task_created = Some(task.id);
                    action_taken = Some("task_created".to_string());
                    format!("Task created: **{description}**\n\nI've added it to your Needs_Action queue.")
                };
                (response, strings(&["Show all tasks", "Create another task"]))
            }
            Intent::Fallback => (
                format!(
                    "I understand you're asking about: *\"{message}\"*\n\n\
                     I'm still learning! Here are some things I can definitely help with right now:"
                ),
                strings(&[
                    "Check system status",
                    "Show pending approvals",
                    "What's urgent?",
                    "Create a new task",
                ]),
            ),
        };

        Ok(ChatReply {
            response,
            action_taken,
            task_created,
            suggestions,
            timestamp: Utc::now(),
        })
    }
}
