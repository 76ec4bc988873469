//! Companion client for the Digital FTE.
//!
//! The non-visual core of the mobile app: a typed REST client, persisted
//! settings, the offline action queue with its reconnect sync, the approvals
//! controller and push payload routing. The `fte` binary drives it from a
//! terminal.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod approvals;
pub mod client;
pub mod error;
pub mod notice;
pub mod persist;
pub mod push;
pub mod queue;
pub mod settings;
pub mod ui;

pub use approvals::{ApprovalsController, Outcome};
pub use client::ApiClient;
pub use error::{ClientError, CompanionError, CompanionResult};
pub use notice::{Notice, NoticeLevel, NoticeSink, Signal, View};
pub use persist::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use push::{PushPayload, Route};
pub use queue::{
    spawn_sync_on_reconnect, ActionSender, ActionType, ConnectivityMonitor, DrainReport,
    OfflineAction, OfflineQueue, MAX_RETRIES,
};
pub use settings::{Settings, SettingsStore, Theme};
