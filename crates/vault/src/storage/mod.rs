//! Storage layer for vault persistence.

mod file;
mod traits;

pub use file::FileVault;
pub use traits::{DecisionResult, TaskStore};
