//! Registered push devices, persisted as a JSON array.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ChannelError;

/// Device platform reported by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    #[default]
    Android,
    Web,
}

impl Platform {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Web => "web",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            "web" => Ok(Self::Web),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub token: String,
    pub device_name: String,
    pub platform: Platform,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Subscription counts reported by `/api/notifications/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionCounts {
    pub total: usize,
    pub active: usize,
    pub by_platform: BTreeMap<String, usize>,
}

/// Push subscriptions keyed by device token.
///
/// Unregistering deactivates the entry rather than deleting it, so a device
/// that registers again keeps its original `created_at`.
pub struct SubscriptionRegistry {
    path: Option<PathBuf>,
    entries: RwLock<Vec<Subscription>>,
}

impl SubscriptionRegistry {
    /// Registry that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Load from `path`. A missing or unreadable file starts empty.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring malformed subscriptions file");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        info!(count = entries.len(), "Loaded push subscriptions");
        Self {
            path: Some(path),
            entries: RwLock::new(entries),
        }
    }

    /// Insert or refresh a subscription by token.
    pub async fn register(
        &self,
        token: &str,
        device_name: &str,
        platform: Platform,
    ) -> Result<Subscription, ChannelError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let subscription = if let Some(existing) = entries.iter_mut().find(|s| s.token == token) {
            existing.device_name = device_name.to_string();
            existing.platform = platform;
            existing.last_used = now;
            existing.active = true;
            existing.clone()
        } else {
            let created = Subscription {
                token: token.to_string(),
                device_name: device_name.to_string(),
                platform,
                created_at: now,
                last_used: now,
                active: true,
            };
            entries.push(created.clone());
            created
        };
        self.persist(&entries).await?;
        info!(device = %subscription.device_name, platform = platform.as_str(), "Push subscription registered");
        Ok(subscription)
    }

    /// Deactivate a token. Returns false when it was never registered.
    pub async fn unregister(&self, token: &str) -> Result<bool, ChannelError> {
        let mut entries = self.entries.write().await;
        let Some(existing) = entries.iter_mut().find(|s| s.token == token) else {
            return Ok(false);
        };
        existing.active = false;
        info!(device = %existing.device_name, "Push subscription deactivated");
        self.persist(&entries).await?;
        Ok(true)
    }

    /// Active subscriptions.
    pub async fn active(&self) -> Vec<Subscription> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect()
    }

    pub async fn counts(&self) -> SubscriptionCounts {
        let entries = self.entries.read().await;
        let mut counts = SubscriptionCounts {
            total: entries.len(),
            ..SubscriptionCounts::default()
        };
        for sub in entries.iter().filter(|s| s.active) {
            counts.active += 1;
            *counts
                .by_platform
                .entry(sub.platform.as_str().to_string())
                .or_default() += 1;
        }
        counts
    }

    async fn persist(&self, entries: &[Subscription]) -> Result<(), ChannelError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
