//! REST API for the Digital FTE vault.
//!
//! This crate provides:
//! - Task listing, creation and human approval over the file vault
//! - Chat, activity, skills, logs and widget endpoints for the dashboard
//! - Push subscription management and manual push triggers
//! - The `fte-server` binary

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use server::{build_router, AppState};
