//! Job state carried from the restore phase to the save phase
//!
//! Restore and save run in separate processes. The restore phase records the
//! key it computed and the key it matched; the save phase reads them back.

use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::fs;
use tracing::debug;

/// Key/value state scoped to a single job run
#[async_trait]
pub trait JobStateStore: Send + Sync {
    /// Record a value under a name
    async fn set_state(&self, name: &str, value: &str) -> CacheResult<()>;

    /// Read a value back, `None` when never set
    async fn get_state(&self, name: &str) -> CacheResult<Option<String>>;
}

/// State slot names for one cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCacheState {
    /// Slot holding the key computed during restore
    pub key_slot: String,
    /// Slot holding the key that restore matched
    pub result_slot: String,
}

impl PersistedCacheState {
    pub fn for_cache(cache_name: &str) -> Self {
        Self {
            key_slot: format!("CACHE_KEY_{}", cache_name),
            result_slot: format!("CACHE_RESULT_{}", cache_name),
        }
    }

    /// Persist the computed key
    pub async fn set_saved_key(&self, store: &dyn JobStateStore, key: &str) -> CacheResult<()> {
        store.set_state(&self.key_slot, key).await
    }

    /// Persist the matched key
    pub async fn set_restore_result(
        &self,
        store: &dyn JobStateStore,
        matched: &str,
    ) -> CacheResult<()> {
        store.set_state(&self.result_slot, matched).await
    }

    /// Computed key, empty values count as unset
    pub async fn saved_key(&self, store: &dyn JobStateStore) -> CacheResult<Option<String>> {
        Ok(store.get_state(&self.key_slot).await?.filter(|v| !v.is_empty()))
    }

    /// Matched key, empty values count as unset
    pub async fn restore_result(&self, store: &dyn JobStateStore) -> CacheResult<Option<String>> {
        Ok(store
            .get_state(&self.result_slot)
            .await?
            .filter(|v| !v.is_empty()))
    }
}

/// Job state persisted as a JSON object on disk
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn load(&self) -> CacheResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            CacheError::io(format!("reading job state {}", self.path.display()), e)
        })?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl JobStateStore for FileStateStore {
    async fn set_state(&self, name: &str, value: &str) -> CacheResult<()> {
        let mut state = self.load().await?;
        state.insert(name.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::io("creating job state directory", e))?;
        }

        let content = serde_json::to_string_pretty(&state)?;
        fs::write(&self.path, content).await.map_err(|e| {
            CacheError::io(format!("writing job state {}", self.path.display()), e)
        })?;

        debug!("Saved state {}={}", name, value);
        Ok(())
    }

    async fn get_state(&self, name: &str) -> CacheResult<Option<String>> {
        Ok(self.load().await?.remove(name))
    }
}

/// Job state held in memory, for a single process
#[derive(Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStateStore for MemoryStateStore {
    async fn set_state(&self, name: &str, value: &str) -> CacheResult<()> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn get_state(&self, name: &str) -> CacheResult<Option<String>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned())
    }
}
