//! Restore and save phases for a single cache
//!
//! The two phases run in different processes of the same job. Restore
//! records the computed key (and the key it matched, if any) in job state;
//! save reads both back to decide whether a write is worthwhile.

use super::key::{build_key, KeyEnvironment};
use super::kinds::CacheOutput;
use super::policy::CachePolicyGate;
use super::state::{JobStateStore, PersistedCacheState};
use super::store::BlobCacheStore;
use crate::error::{CacheError, CacheResult};
use std::fmt;
use tracing::{debug, info, warn};

/// Result of the restore phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Output was already on disk, cache untouched
    SkippedExists,
    /// Reading is disabled for this cache
    SkippedDisabled,
    /// No key matched
    Miss,
    /// Restored from `matched_key` (exact or fallback)
    Restored { matched_key: String },
}

impl fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedExists => write!(f, "skipped (output exists)"),
            Self::SkippedDisabled => write!(f, "skipped (disabled)"),
            Self::Miss => write!(f, "miss"),
            Self::Restored { matched_key } => write!(f, "restored from {}", matched_key),
        }
    }
}

/// Result of the save phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing on disk to save
    SkippedNoOutput,
    /// Restore never computed a key (output pre-existed or cache disabled)
    SkippedNoKey,
    /// Cache is read-only for this job
    SkippedReadOnly,
    /// Restore matched the exact key, content is already stored
    SkippedExactHit,
    /// Written under `key`
    Saved { key: String },
    /// Write failed; the job carries on
    SavedWithWarning { key: String, message: String },
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedNoOutput => write!(f, "skipped (no output)"),
            Self::SkippedNoKey => write!(f, "skipped (no key)"),
            Self::SkippedReadOnly => write!(f, "skipped (read-only)"),
            Self::SkippedExactHit => write!(f, "skipped (exact hit)"),
            Self::Saved { key } => write!(f, "saved as {}", key),
            Self::SavedWithWarning { message, .. } => write!(f, "not saved: {}", message),
        }
    }
}

/// Drives restore and save for any [`CacheOutput`]
pub struct CacheController<'a> {
    policy: CachePolicyGate<'a>,
    key_env: &'a KeyEnvironment,
    store: &'a dyn BlobCacheStore,
    state: &'a dyn JobStateStore,
}

impl<'a> CacheController<'a> {
    pub fn new(
        policy: CachePolicyGate<'a>,
        key_env: &'a KeyEnvironment,
        store: &'a dyn BlobCacheStore,
        state: &'a dyn JobStateStore,
    ) -> Self {
        Self {
            policy,
            key_env,
            store,
            state,
        }
    }

    /// Restore the output from the best matching cache entry
    pub async fn restore<C: CacheOutput + ?Sized>(&self, output: &C) -> CacheResult<RestoreOutcome> {
        let description = output.description();

        if output.output_exists() {
            info!("{} already exists. Not restoring from cache.", description);
            return Ok(RestoreOutcome::SkippedExists);
        }

        if !self.policy.can_read(output.cache_name())? {
            info!("{} cache is disabled. Not restoring.", description);
            return Ok(RestoreOutcome::SkippedDisabled);
        }

        let cache_key = build_key(output.cache_name(), self.key_env);
        let slots = PersistedCacheState::for_cache(output.cache_name());
        slots.set_saved_key(self.state, &cache_key.key).await?;

        let paths = output.cache_paths();
        debug!(
            "Restoring {:?} with key {} and restore keys {:?}",
            paths, cache_key.key, cache_key.restore_keys
        );

        let matched = match self
            .store
            .restore(&paths, &cache_key.key, &cache_key.restore_keys)
            .await
        {
            Ok(matched) => matched,
            Err(e) if e.is_validation() => {
                return Err(CacheError::StoreValidation(e.to_string()));
            }
            Err(e) => {
                warn!("{} cache restore failed: {}", description, e);
                None
            }
        };

        let Some(matched_key) = matched else {
            info!("{} cache not found. Will start with empty.", description);
            return Ok(RestoreOutcome::Miss);
        };

        slots.set_restore_result(self.state, &matched_key).await?;
        info!("{} restored from cache key: {}", description, matched_key);
        Ok(RestoreOutcome::Restored { matched_key })
    }

    /// Save the output unless the restore phase made that pointless
    pub async fn save<C: CacheOutput + ?Sized>(&self, output: &C) -> CacheResult<SaveOutcome> {
        let description = output.description();

        if !output.output_exists() {
            debug!("No {} to cache.", description);
            return Ok(SaveOutcome::SkippedNoOutput);
        }

        let slots = PersistedCacheState::for_cache(output.cache_name());
        let Some(cache_key) = slots.saved_key(self.state).await? else {
            info!(
                "{} existed prior to cache restore. Not saving.",
                description
            );
            return Ok(SaveOutcome::SkippedNoKey);
        };

        if !self.policy.can_write(output.cache_name())? {
            info!("{} cache is read-only. Not saving.", description);
            return Ok(SaveOutcome::SkippedReadOnly);
        }

        let cache_result = slots.restore_result(self.state).await?;
        if cache_result.as_deref() == Some(cache_key.as_str()) {
            info!(
                "Cache hit occurred on the cache key {}, not saving cache.",
                cache_key
            );
            return Ok(SaveOutcome::SkippedExactHit);
        }

        info!("Caching {} with cache key: {}", description, cache_key);
        match self.store.save(&output.cache_paths(), &cache_key).await {
            Ok(()) => Ok(SaveOutcome::Saved { key: cache_key }),
            Err(e) if e.is_validation() => Err(CacheError::StoreValidation(e.to_string())),
            Err(e) => {
                let message = e.to_string();
                warn!("{}", message);
                Ok(SaveOutcome::SavedWithWarning {
                    key: cache_key,
                    message,
                })
            }
        }
    }
}
