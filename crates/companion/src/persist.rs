//! Key/value persistence for client state.
//!
//! State blobs are stored in the same `{"state": ..., "version": 0}` envelope
//! the mobile app persists, one blob per key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::CompanionResult;

pub const OFFLINE_QUEUE_KEY: &str = "offline-queue-storage";
pub const SETTINGS_KEY: &str = "settings-storage";

/// Storage backend for persisted client state.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&self, key: &str) -> CompanionResult<Option<String>>;

    async fn save(&self, key: &str, value: &str) -> CompanionResult<()>;
}

/// One `<key>.json` file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn load(&self, key: &str) -> CompanionResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> CompanionResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(key, path = %path.display(), "State saved");
        Ok(())
    }
}

/// In-memory store for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn load(&self, key: &str) -> CompanionResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> CompanionResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

/// Load and unwrap a persisted state blob.
pub async fn load_state<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> CompanionResult<Option<T>> {
    match store.load(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str::<Envelope<T>>(&raw)?.state)),
        None => Ok(None),
    }
}

/// Wrap and persist a state blob.
pub async fn save_state<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    state: &T,
) -> CompanionResult<()> {
    let raw = serde_json::to_string(&Envelope { state, version: 0 })?;
    store.save(key, &raw).await
}
