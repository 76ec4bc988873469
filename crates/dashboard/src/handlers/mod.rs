//! Route handlers, grouped by area.

pub mod chat;
pub mod notifications;
pub mod tasks;
pub mod widgets;

use serde::Deserialize;

/// `?limit=` query shared by list endpoints.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub fn or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default)
    }
}
