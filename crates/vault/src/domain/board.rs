//! Task board filtering.

use serde::{Deserialize, Serialize};

use crate::entities::Task;

/// Whether a task matches a board search term (case-insensitive substring
/// of the content or filename). Only the empty term matches everything;
/// whitespace in the term is significant.
pub fn matches_search(task: &Task, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    task.content.to_lowercase().contains(&term) || task.filename.to_lowercase().contains(&term)
}

/// Pending and completed columns of the dashboard board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskBoard {
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
}

impl TaskBoard {
    pub fn new(pending: Vec<Task>, completed: Vec<Task>) -> Self {
        Self { pending, completed }
    }

    /// Board restricted to tasks matching `term` in both columns.
    pub fn filter(&self, term: &str) -> Self {
        let keep = |tasks: &[Task]| {
            tasks
                .iter()
                .filter(|t| matches_search(t, term))
                .cloned()
                .collect()
        };
        Self {
            pending: keep(&self.pending),
            completed: keep(&self.completed),
        }
    }

    /// Operation count shown next to the filter bar.
    pub fn total(&self) -> usize {
        self.pending.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::VaultFolder;
    use chrono::Utc;

    fn task(filename: &str, content: &str, folder: VaultFolder) -> Task {
        let now = Utc::now();
        Task::from_markdown(filename, folder, content.to_string(), now, now)
    }

    #[test]
    fn test_filter_by_content() {
        let board = TaskBoard::new(
            vec![
                task("a.md", "deploy service", VaultFolder::NeedsAction),
                task("b.md", "write report", VaultFolder::NeedsAction),
            ],
            vec![],
        );

        let filtered = board.filter("deploy");
        assert_eq!(filtered.total(), 1);
        assert_eq!(filtered.pending[0].filename, "a.md");
    }

    #[test]
    fn test_filter_is_case_insensitive_and_covers_filename() {
        let board = TaskBoard::new(
            vec![task("INVOICE_march.md", "pay vendor", VaultFolder::NeedsAction)],
            vec![task("done.md", "Deployed the API", VaultFolder::Done)],
        );

        assert_eq!(board.filter("invoice").pending.len(), 1);
        assert_eq!(board.filter("DEPLOY").completed.len(), 1);
        assert!(board.filter("nothing-matches").is_empty());
    }

    #[test]
    fn test_empty_term_keeps_everything() {
        let board = TaskBoard::new(
            vec![task("a.md", "x", VaultFolder::NeedsAction)],
            vec![task("b.md", "y", VaultFolder::Done)],
        );
        assert_eq!(board.filter("").total(), 2);
    }

    #[test]
    fn test_whitespace_in_term_is_matched_literally() {
        let deploy = task("a.md", "deploy service", VaultFolder::NeedsAction);
        assert!(!matches_search(&deploy, " deploy"));
        assert!(!matches_search(&deploy, "   "));
        assert!(matches_search(&deploy, "deploy service"));
        assert!(matches_search(&deploy, "y s"));

        let board = TaskBoard::new(vec![deploy], vec![]);
        assert!(board.filter("   ").is_empty());
    }
}
