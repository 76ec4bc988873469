//! YAML frontmatter parsing for vault task files.
//!
//! Task files start with an optional `---` delimited YAML block followed by a
//! markdown body. Watchers write loosely formatted frontmatter (unquoted
//! subjects containing colons are common), so strict YAML parsing falls back
//! to a line-oriented `key: value` scan.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::entities::{Priority, TaskStatus};

const UNTITLED: &str = "Untitled Task";
const DEFAULT_SCORE: f64 = 0.3;
const DESCRIPTION_LIMIT: usize = 500;
const TITLE_LIMIT: usize = 80;

static FRONTMATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---").unwrap());

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^##\s+(.+)$").unwrap());

/// Metadata extracted from a task document.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskMetadata {
    pub title: String,
    pub priority: Priority,
    pub source: String,
    pub risk_score: f64,
    pub complexity_score: f64,
    pub description: String,
}

/// Split a document into its raw frontmatter block and body.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    match FRONTMATTER.captures(content) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let yaml = caps.get(1).map(|m| m.as_str());
            (yaml, &content[whole..])
        }
        None => (None, content),
    }
}

/// Parse frontmatter key/value pairs with lowercase keys.
pub fn parse_fields(yaml: &str) -> BTreeMap<String, String> {
    match serde_yaml::from_str::<BTreeMap<String, serde_yaml::Value>>(yaml) {
        Ok(map) => map
            .into_iter()
            .filter_map(|(k, v)| scalar_to_string(&v).map(|s| (k.trim().to_lowercase(), s)))
            .collect(),
        Err(_) => yaml
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
            .collect(),
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extract title, priority, source, scores and description from a task document.
pub fn parse_task_metadata(content: &str) -> TaskMetadata {
    let (yaml, body) = split_frontmatter(content);
    let mut meta = TaskMetadata {
        title: UNTITLED.to_string(),
        priority: Priority::Medium,
        source: "unknown".to_string(),
        risk_score: DEFAULT_SCORE,
        complexity_score: DEFAULT_SCORE,
        description: String::new(),
    };

    if let Some(yaml) = yaml {
        for (key, value) in parse_fields(yaml) {
            match key.as_str() {
                "type" => meta.source = value,
                "priority" => {
                    if let Ok(p) = value.parse() {
                        meta.priority = p;
                    }
                }
                "subject" | "title" if !value.is_empty() => meta.title = value,
                "risk_score" => {
                    if let Ok(score) = value.parse() {
                        meta.risk_score = score;
                    }
                }
                "complexity_score" => {
                    if let Ok(score) = value.parse() {
                        meta.complexity_score = score;
                    }
                }
                _ => {}
            }
        }
    }

    if meta.title == UNTITLED {
        if let Some(title) = infer_title(content) {
            meta.title = title;
        }
    }

    if let Some(priority) = detect_priority(content) {
        meta.priority = priority;
    }

    meta.description = truncate_chars(body.trim(), DESCRIPTION_LIMIT);
    meta
}

/// First `## ` heading, else the first plain line that is not a delimiter or heading.
fn infer_title(content: &str) -> Option<String> {
    if let Some(caps) = HEADING.captures(content) {
        return caps.get(1).map(|m| m.as_str().trim().to_string());
    }

    let (_, body) = split_frontmatter(content);
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("---") && !line.starts_with('#'))
        .map(|line| truncate_chars(line, TITLE_LIMIT))
}

/// Status recorded in the frontmatter, if it is a known label.
pub fn declared_status(content: &str) -> Option<TaskStatus> {
    let (yaml, _) = split_frontmatter(content);
    parse_fields(yaml?)
        .get("status")
        .and_then(|label| TaskStatus::from_label(label))
}

/// Keyword priority detection applied over the whole document.
pub fn detect_priority(content: &str) -> Option<Priority> {
    let lower = content.to_lowercase();
    if lower.contains("urgent") || lower.contains("asap") {
        Some(Priority::Urgent)
    } else if lower.contains("high priority") || lower.contains("important") {
        Some(Priority::High)
    } else if lower.contains("low priority") {
        Some(Priority::Low)
    } else {
        None
    }
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Frontmatter written for tasks created from the dashboard or chat.
#[derive(Debug, Serialize)]
pub struct NewTaskFrontmatter<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub priority: Priority,
    pub created: String,
    pub status: &'a str,
    pub title: &'a str,
}

/// Render a full task document: frontmatter, heading and body.
pub fn render_document(front: &NewTaskFrontmatter<'_>, body: &str) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(front)?;
    Ok(format!(
        "---\n{}---\n\n## {}\n\n{}\n",
        yaml,
        front.title,
        body.trim_end()
    ))
}
