//! Terminal output for the `fte` CLI.

#![allow(clippy::disallowed_macros)]

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use vault::{ActivityItem, ChatRecord, ChatRole, DashboardSummary, Priority, Task};

use crate::notice::{Notice, NoticeLevel};
use crate::queue::{ActionType, OfflineAction};
use crate::settings::Settings;

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::DarkGrey,
        Priority::Medium => Color::White,
        Priority::High => Color::Yellow,
        Priority::Urgent => Color::Red,
    }
}

fn risk_color(score: f64) -> Color {
    if score >= 0.7 {
        Color::Red
    } else if score >= 0.4 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::new(n).fg(Color::Cyan)).collect()
}

/// Table of tasks waiting for a decision.
pub fn task_table(tasks: &[Task]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["ID", "Title", "Priority", "Source", "Risk"]));

    for task in tasks {
        table.add_row(vec![
            Cell::new(&task.id),
            Cell::new(&task.title),
            Cell::new(task.priority.to_string()).fg(priority_color(task.priority)),
            Cell::new(&task.source),
            Cell::new(format!("{:.0}%", task.risk_score * 100.0)).fg(risk_color(task.risk_score)),
        ]);
    }
    table
}

pub fn activity_table(items: &[ActivityItem]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["When", "Activity", "Description", "Status"]));

    for item in items {
        let when = item.timestamp.get(..19).unwrap_or(&item.timestamp);
        table.add_row(vec![
            Cell::new(when).fg(Color::DarkGrey),
            Cell::new(&item.title),
            Cell::new(&item.description),
            Cell::new(&item.status),
        ]);
    }
    table
}

pub fn queue_table(actions: &[OfflineAction]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["Action", "Task", "Note", "Retries", "Queued at"]));

    for action in actions {
        let color = match action.kind {
            ActionType::Approve => Color::Green,
            ActionType::Reject => Color::Red,
        };
        let queued = chrono::DateTime::from_timestamp_millis(action.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(action.kind.to_string()).fg(color),
            Cell::new(&action.payload.task_id),
            Cell::new(action.payload.note.as_deref().unwrap_or("-")),
            Cell::new(action.retry_count),
            Cell::new(queued).fg(Color::DarkGrey),
        ]);
    }
    table
}

pub fn display_dashboard(summary: &DashboardSummary) {
    println!("{}", "═".repeat(40).dimmed());
    println!("{}", "Digital FTE".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!("  {:<18} {}", "Pending:", summary.pending_count.to_string().yellow());
    println!("  {:<18} {}", "In progress:", summary.in_progress_count.to_string().cyan());
    println!("  {:<18} {}", "Done today:", summary.done_today_count.to_string().green());
    let urgent = summary.urgent_count.to_string();
    let urgent = if summary.urgent_count > 0 {
        urgent.red().bold()
    } else {
        urgent.normal()
    };
    println!("  {:<18} {}", "Urgent:", urgent);
    println!(
        "  {:<18} {}",
        "Updated:",
        summary.last_updated.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
    );
}

pub fn display_task_details(task: &Task) {
    println!("{}", "═".repeat(60).dimmed());
    println!(
        "{} {} {}",
        "Task".cyan().bold(),
        task.id.cyan().bold(),
        format!("[{}]", task.folder).yellow()
    );
    println!("{}", "═".repeat(60).dimmed());
    println!("{} {}", "Title:".bold(), task.title);
    println!(
        "{} {}",
        "Priority:".bold(),
        task.priority.to_string().color(match task.priority {
            Priority::Urgent => colored::Color::Red,
            Priority::High => colored::Color::Yellow,
            _ => colored::Color::White,
        })
    );
    println!("{} {}", "Source:".bold(), task.source);
    println!(
        "{} {:.0}%  {} {:.0}%",
        "Risk:".bold(),
        task.risk_score * 100.0,
        "Complexity:".bold(),
        task.complexity_score * 100.0
    );
    println!();
    println!("{}", task.content);
}

pub fn display_chat(records: &[ChatRecord]) {
    for record in records {
        let who = match record.role {
            ChatRole::User => "you".blue().bold(),
            ChatRole::Agent => "fte".green().bold(),
        };
        println!("{who} {}", record.content);
        if !record.suggestions.is_empty() {
            println!("    {}", record.suggestions.join(" · ").dimmed());
        }
    }
}

pub fn display_settings(settings: &Settings, effective_url: &str) {
    let on_off = |v: bool| if v { "on".green() } else { "off".red() };
    println!("{} {:?}", "Theme:".bold(), settings.theme);
    println!("{} {}", "API URL:".bold(), settings.api_base_url);
    if effective_url != settings.api_base_url {
        println!("  {} {}", "overridden by FTE_API_URL:".dimmed(), effective_url);
    }
    println!("{}", "Notifications:".bold());
    println!("  approvals   {}", on_off(settings.notifications.approvals));
    println!("  suggestions {}", on_off(settings.notifications.suggestions));
    println!("  digest      {}", on_off(settings.notifications.digest));
}

pub fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => print_info(&notice.message),
        NoticeLevel::Success => print_success(&notice.message),
        NoticeLevel::Error => print_error(&notice.message),
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
