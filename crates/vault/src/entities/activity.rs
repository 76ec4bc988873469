//! Audit trail, activity feed and chat history records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of the JSONL audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// `domain.operation`, e.g. `task.approved`
    pub action: String,
    /// `orchestrator`, `human`, `watcher`, ...
    pub actor: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub details: HashMap<String, Value>,
    #[serde(default)]
    pub approval_required: bool,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

fn default_domain() -> String {
    "system".to_string()
}

fn default_status() -> String {
    "success".to_string()
}

impl AuditEntry {
    /// New entry stamped with the current time.
    pub fn new(action: impl Into<String>, actor: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            action: action.into(),
            actor: actor.into(),
            domain: default_domain(),
            resource: resource.into(),
            status: default_status(),
            details: HashMap::new(),
            approval_required: false,
            approved_by: None,
            error: None,
            duration_ms: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn approved_by(mut self, who: impl Into<String>) -> Self {
        self.approved_by = Some(who.into());
        self
    }
}

/// Feed item shown on the mobile dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub timestamp: String,
    pub status: String,
}

impl From<&AuditEntry> for ActivityItem {
    fn from(entry: &AuditEntry) -> Self {
        let description = entry
            .details
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            id: entry.timestamp.clone(),
            kind: entry.action.clone(),
            title: title_case(&entry.action),
            description,
            timestamp: entry.timestamp.clone(),
            status: entry.status.clone(),
        }
    }
}

/// `task.approved` -> `Task Approved`
fn title_case(action: &str) -> String {
    action
        .split(['_', '.'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

/// One line of the chat history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_title_case() {
        let entry = AuditEntry::new("odoo.create_invoice", "orchestrator", "inv_1")
            .with_detail("description", "Invoice for Acme");
        let item = ActivityItem::from(&entry);
        assert_eq!(item.title, "Odoo Create Invoice");
        assert_eq!(item.description, "Invoice for Acme");
        assert_eq!(item.kind, "odoo.create_invoice");
    }

    #[test]
    fn test_audit_entry_tolerates_missing_fields() {
        let entry: AuditEntry =
            serde_json::from_str(r#"{"timestamp":"t","action":"email_sent","actor":"watcher"}"#)
                .unwrap();
        assert_eq!(entry.status, "success");
        assert_eq!(entry.domain, "system");
        assert!(entry.details.is_empty());
    }
}
