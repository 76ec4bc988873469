//! Persisted client settings.

use std::sync::Arc;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{CompanionError, CompanionResult};
use crate::persist::{load_state, save_state, KeyValueStore, SETTINGS_KEY};

pub const DEFAULT_API_BASE_URL: &str = "http://10.0.2.2:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    System,
}

impl std::str::FromStr for Theme {
    type Err = CompanionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            "system" => Ok(Self::System),
            other => Err(CompanionError::InvalidSetting(format!("unknown theme: {other}"))),
        }
    }
}

/// Which notification categories the user wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKey {
    Approvals,
    Suggestions,
    Digest,
}

impl std::str::FromStr for NotificationKey {
    type Err = CompanionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approvals" => Ok(Self::Approvals),
            "suggestions" => Ok(Self::Suggestions),
            "digest" => Ok(Self::Digest),
            other => Err(CompanionError::InvalidSetting(format!(
                "unknown notification: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub approvals: bool,
    pub suggestions: bool,
    pub digest: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            approvals: true,
            suggestions: true,
            digest: true,
        }
    }
}

impl NotificationPrefs {
    pub fn get(&self, key: NotificationKey) -> bool {
        match key {
            NotificationKey::Approvals => self.approvals,
            NotificationKey::Suggestions => self.suggestions,
            NotificationKey::Digest => self.digest,
        }
    }

    fn slot(&mut self, key: NotificationKey) -> &mut bool {
        match key {
            NotificationKey::Approvals => &mut self.approvals,
            NotificationKey::Suggestions => &mut self.suggestions,
            NotificationKey::Digest => &mut self.digest,
        }
    }

    /// Whether a push of this category should be shown. System pushes always are.
    pub fn allows(&self, category: notify::Category) -> bool {
        match category {
            notify::Category::Approvals => self.approvals,
            notify::Category::Suggestions => self.suggestions,
            notify::Category::Digest => self.digest,
            notify::Category::System => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub notifications: NotificationPrefs,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            api_base_url: default_api_base_url(),
            notifications: NotificationPrefs::default(),
        }
    }
}

/// Check that `raw` is an http(s) URL and drop any trailing `/`.
pub fn normalize_api_url(raw: &str) -> CompanionResult<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| CompanionError::InvalidSetting(format!("invalid URL {trimmed}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CompanionError::InvalidSetting(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Settings loaded once and saved after every change.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    settings: RwLock<Settings>,
}

impl SettingsStore {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> CompanionResult<Self> {
        let settings = load_state(store.as_ref(), SETTINGS_KEY)
            .await?
            .unwrap_or_default();
        Ok(Self {
            store,
            settings: RwLock::new(settings),
        })
    }

    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    async fn update(&self, change: impl FnOnce(&mut Settings)) -> CompanionResult<Settings> {
        let mut settings = self.settings.write().await;
        change(&mut settings);
        save_state(self.store.as_ref(), SETTINGS_KEY, &*settings).await?;
        Ok(settings.clone())
    }

    pub async fn set_theme(&self, theme: Theme) -> CompanionResult<Settings> {
        self.update(|s| s.theme = theme).await
    }

    pub async fn set_api_base_url(&self, raw: &str) -> CompanionResult<Settings> {
        let url = normalize_api_url(raw)?;
        info!(url = %url, "API base URL changed");
        self.update(|s| s.api_base_url = url).await
    }

    /// Flip one notification preference and return its new value.
    pub async fn toggle_notification(&self, key: NotificationKey) -> CompanionResult<bool> {
        let settings = self
            .update(|s| {
                let slot = s.notifications.slot(key);
                *slot = !*slot;
            })
            .await?;
        Ok(settings.notifications.get(key))
    }

    pub async fn reset(&self) -> CompanionResult<Settings> {
        self.update(|s| *s = Settings::default()).await
    }
}
