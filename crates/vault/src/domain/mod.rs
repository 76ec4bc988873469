//! Domain facades for the dashboard.
//!
//! These facades provide high-level operations that combine
//! storage operations with audit logging and form validation.

pub mod board;
mod tasks;

pub use board::{matches_search, TaskBoard};
pub use tasks::{TaskForm, TasksDomain};
