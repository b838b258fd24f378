//! Blob cache stores
//!
//! The lifecycle talks to the cache backend only through [`BlobCacheStore`].
//! [`LocalDirStore`] keeps entries in a directory so the tool works without a
//! hosted cache service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Longest key the store accepts
pub const MAX_KEY_LENGTH: usize = 512;

/// Failures reported by a blob store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The request itself is malformed; retrying cannot help
    #[error("{0}")]
    Validation(String),

    /// Any other failure (network, reservation conflict, missing paths)
    #[error("{0}")]
    Other(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the error must fail the job
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Key-value store for cached directory trees
#[async_trait]
pub trait BlobCacheStore: Send + Sync {
    /// Restore `paths` from the first matching key.
    ///
    /// `primary_key` is tried first, then each of `fallback_keys` in order.
    /// Returns the key that matched, or `None` on a miss.
    async fn restore(
        &self,
        paths: &[PathBuf],
        primary_key: &str,
        fallback_keys: &[String],
    ) -> Result<Option<String>, StoreError>;

    /// Save `paths` under `key`
    async fn save(&self, paths: &[PathBuf], key: &str) -> Result<(), StoreError>;
}

/// Check a save or restore request before touching storage
pub fn validate_request(paths: &[PathBuf], keys: &[&str]) -> Result<(), StoreError> {
    if paths.is_empty() {
        return Err(StoreError::Validation(
            "Path Validation Error: At least one directory or file path is required".to_string(),
        ));
    }

    for key in keys {
        if key.chars().count() > MAX_KEY_LENGTH {
            return Err(StoreError::Validation(format!(
                "Key Validation Error: {} cannot be larger than {} characters.",
                key, MAX_KEY_LENGTH
            )));
        }
        if key.contains(',') {
            return Err(StoreError::Validation(format!(
                "Key Validation Error: {} cannot contain commas.",
                key
            )));
        }
    }

    Ok(())
}

/// One saved cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreEntry {
    key: String,
    dir: String,
    paths: Vec<PathBuf>,
    created_at: DateTime<Utc>,
}

/// Blob store backed by a local directory
///
/// Layout:
///
/// ```text
/// <root>/index.json
/// <root>/entries/<sha256(key)>/<n>   copy of the n-th cached path
/// ```
///
/// Entries only match requests for the same list of paths.
#[derive(Debug, Clone)]
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn entry_dir(&self, dir: &str) -> PathBuf {
        self.root.join("entries").join(dir)
    }

    fn load_index(&self) -> Result<Vec<StoreEntry>, StoreError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| StoreError::io(format!("reading {}", path.display()), e))?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Other(format!("corrupt cache index {}: {}", path.display(), e)))
    }

    fn write_index(&self, entries: &[StoreEntry]) -> Result<(), StoreError> {
        let path = self.index_path();
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Other(format!("serializing cache index: {}", e)))?;
        fs::write(&path, content)
            .map_err(|e| StoreError::io(format!("writing {}", path.display()), e))
    }

    /// Find the entry for the first candidate key that matches
    fn find_entry(
        entries: &[StoreEntry],
        paths: &[PathBuf],
        candidates: &[&str],
    ) -> Option<StoreEntry> {
        let compatible: Vec<&StoreEntry> = entries.iter().filter(|e| e.paths == paths).collect();

        for candidate in candidates {
            if let Some(exact) = compatible.iter().find(|e| e.key == *candidate) {
                return Some((*exact).clone());
            }

            let newest = compatible
                .iter()
                .filter(|e| e.key.starts_with(candidate))
                .max_by_key(|e| e.created_at);
            if let Some(entry) = newest {
                return Some((*entry).clone());
            }
        }

        None
    }

    fn restore_blocking(
        &self,
        paths: &[PathBuf],
        candidates: &[&str],
    ) -> Result<Option<String>, StoreError> {
        let entries = self.load_index()?;
        let Some(entry) = Self::find_entry(&entries, paths, candidates) else {
            return Ok(None);
        };

        let entry_dir = self.entry_dir(&entry.dir);
        for (n, target) in entry.paths.iter().enumerate() {
            let source = entry_dir.join(n.to_string());
            if !source.exists() {
                debug!("Entry {} has no copy of {}", entry.key, target.display());
                continue;
            }
            copy_tree(&source, target).map_err(|e| {
                StoreError::io(format!("restoring {}", target.display()), e)
            })?;
        }

        Ok(Some(entry.key))
    }

    fn save_blocking(&self, paths: &[PathBuf], key: &str) -> Result<(), StoreError> {
        let missing: Vec<String> = paths
            .iter()
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect();
        if missing.len() == paths.len() {
            return Err(StoreError::Other(format!(
                "Path Validation Error: Path(s) specified for caching do not exist, hence no cache is being saved: {}",
                missing.join(", ")
            )));
        }

        fs::create_dir_all(self.root.join("entries"))
            .map_err(|e| StoreError::io(format!("creating {}", self.root.display()), e))?;

        let mut entries = self.load_index()?;
        if entries.iter().any(|e| e.key == key) {
            return Err(StoreError::Other(format!(
                "Unable to reserve cache with key {}, another job may be creating this cache.",
                key
            )));
        }

        let dir = hex::encode(Sha256::digest(key.as_bytes()));
        let entry_dir = self.entry_dir(&dir);
        if entry_dir.exists() {
            fs::remove_dir_all(&entry_dir)
                .map_err(|e| StoreError::io(format!("clearing {}", entry_dir.display()), e))?;
        }

        for (n, source) in paths.iter().enumerate() {
            if !source.exists() {
                continue;
            }
            if let Err(e) = copy_tree(source, &entry_dir.join(n.to_string())) {
                let _ = fs::remove_dir_all(&entry_dir);
                return Err(StoreError::io(format!("saving {}", source.display()), e));
            }
        }

        entries.push(StoreEntry {
            key: key.to_string(),
            dir,
            paths: paths.to_vec(),
            created_at: Utc::now(),
        });
        self.write_index(&entries)
    }
}

#[async_trait]
impl BlobCacheStore for LocalDirStore {
    async fn restore(
        &self,
        paths: &[PathBuf],
        primary_key: &str,
        fallback_keys: &[String],
    ) -> Result<Option<String>, StoreError> {
        let mut candidates = vec![primary_key];
        candidates.extend(fallback_keys.iter().map(String::as_str));
        validate_request(paths, &candidates)?;

        let store = self.clone();
        let paths = paths.to_vec();
        let candidates: Vec<String> = candidates.into_iter().map(str::to_string).collect();

        tokio::task::spawn_blocking(move || {
            let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
            store.restore_blocking(&paths, &candidates)
        })
        .await
        .map_err(|e| StoreError::Other(format!("restore task failed: {}", e)))?
    }

    async fn save(&self, paths: &[PathBuf], key: &str) -> Result<(), StoreError> {
        validate_request(paths, &[key])?;

        let store = self.clone();
        let paths = paths.to_vec();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            store.save_blocking(&paths, &key)?;
            info!("Cache saved with key: {}", key);
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Other(format!("save task failed: {}", e)))?
    }
}

/// Copy a file or directory tree, merging into any existing destination.
/// Symlinks are recreated as links and never followed.
fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let dst = if rel.as_os_str().is_empty() {
            target.to_path_buf()
        } else {
            target.join(rel)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&dst)?;
            continue;
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        if file_type.is_symlink() {
            copy_link(entry.path(), &dst)?;
        } else {
            fs::copy(entry.path(), &dst)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_link(source: &Path, target: &Path) -> io::Result<()> {
    let link = fs::read_link(source)?;
    if fs::symlink_metadata(target).is_ok() {
        fs::remove_file(target)?;
    }
    std::os::unix::fs::symlink(link, target)
}

#[cfg(not(unix))]
fn copy_link(source: &Path, _target: &Path) -> io::Result<()> {
    debug!("Skipping symlink {}", source.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        store: LocalDirStore,
        cached: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let cached = temp.path().join("home").join("caches");
        fs::create_dir_all(cached.join("modules-2")).unwrap();
        let store = LocalDirStore::new(temp.path().join("store"));
        Fixture {
            _temp: temp,
            store,
            cached,
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn validate_empty_paths() {
        let err = validate_request(&[], &["key"]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn validate_long_key() {
        let key = "k".repeat(MAX_KEY_LENGTH + 1);
        let err = validate_request(&[PathBuf::from("/tmp")], &[key.as_str()]).unwrap_err();
        assert!(err.to_string().contains("cannot be larger than 512"));

        let key = "k".repeat(MAX_KEY_LENGTH);
        assert!(validate_request(&[PathBuf::from("/tmp")], &[key.as_str()]).is_ok());
    }

    #[test]
    fn validate_key_length_counts_characters() {
        // 512 characters, 1024 bytes
        let key = "é".repeat(MAX_KEY_LENGTH);
        assert!(validate_request(&[PathBuf::from("/tmp")], &[key.as_str()]).is_ok());

        let key = "é".repeat(MAX_KEY_LENGTH + 1);
        let err = validate_request(&[PathBuf::from("/tmp")], &[key.as_str()]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn validate_comma_key() {
        let err = validate_request(&[PathBuf::from("/tmp")], &["a,b"]).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("cannot contain commas"));
    }

    #[tokio::test]
    async fn save_then_restore_exact() {
        let f = fixture();
        let file = f.cached.join("modules-2").join("lib.jar");
        write(&file, "jar");
        let paths = vec![f.cached.clone()];

        f.store.save(&paths, "deps|Linux|build[x]-sha1").await.unwrap();
        fs::remove_dir_all(&f.cached).unwrap();

        let matched = f
            .store
            .restore(&paths, "deps|Linux|build[x]-sha1", &["deps|Linux".to_string()])
            .await
            .unwrap();

        assert_eq!(matched.as_deref(), Some("deps|Linux|build[x]-sha1"));
        assert_eq!(fs::read_to_string(&file).unwrap(), "jar");
    }

    #[tokio::test]
    async fn restore_falls_back_by_prefix() {
        let f = fixture();
        let paths = vec![f.cached.clone()];
        f.store.save(&paths, "deps|Linux|build[x]-sha1").await.unwrap();

        let matched = f
            .store
            .restore(
                &paths,
                "deps|Linux|build[x]-sha2",
                &[
                    "deps|Linux|build[x]".to_string(),
                    "deps|Linux|build".to_string(),
                    "deps|Linux".to_string(),
                ],
            )
            .await
            .unwrap();

        assert_eq!(matched.as_deref(), Some("deps|Linux|build[x]-sha1"));
    }

    #[tokio::test]
    async fn restore_prefers_newest_prefix_match() {
        let f = fixture();
        let paths = vec![f.cached.clone()];
        f.store.save(&paths, "deps|Linux|a").await.unwrap();
        f.store.save(&paths, "deps|Linux|b").await.unwrap();

        let matched = f
            .store
            .restore(&paths, "deps|Linux|c", &["deps|Linux".to_string()])
            .await
            .unwrap();

        assert_eq!(matched.as_deref(), Some("deps|Linux|b"));
    }

    #[tokio::test]
    async fn restore_miss() {
        let f = fixture();
        let paths = vec![f.cached.clone()];
        f.store.save(&paths, "deps|Windows").await.unwrap();

        let matched = f
            .store
            .restore(&paths, "deps|Linux|x", &["deps|Linux".to_string()])
            .await
            .unwrap();
        assert!(matched.is_none());
    }

    #[tokio::test]
    async fn restore_ignores_entries_for_other_paths() {
        let f = fixture();
        f.store.save(&[f.cached.clone()], "deps|Linux").await.unwrap();

        let other = vec![f.cached.join("modules-2")];
        let matched = f.store.restore(&other, "deps|Linux", &[]).await.unwrap();
        assert!(matched.is_none());
    }

    #[tokio::test]
    async fn save_existing_key_is_not_validation() {
        let f = fixture();
        let paths = vec![f.cached.clone()];
        f.store.save(&paths, "deps|Linux").await.unwrap();

        let err = f.store.save(&paths, "deps|Linux").await.unwrap_err();
        assert!(!err.is_validation());
        assert!(err.to_string().contains("Unable to reserve cache"));
    }

    #[tokio::test]
    async fn save_missing_paths_is_not_validation() {
        let f = fixture();
        let err = f
            .store
            .save(&[f.cached.join("absent")], "deps|Linux")
            .await
            .unwrap_err();
        assert!(!err.is_validation());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_loop_is_kept_as_link() {
        let f = fixture();
        write(&f.cached.join("jars").join("lib.jar"), "jar");
        std::os::unix::fs::symlink("..", f.cached.join("jars").join("loop")).unwrap();
        let paths = vec![f.cached.clone()];

        f.store.save(&paths, "deps|Linux").await.unwrap();
        fs::remove_dir_all(&f.cached).unwrap();

        let matched = f.store.restore(&paths, "deps|Linux", &[]).await.unwrap();
        assert_eq!(matched.as_deref(), Some("deps|Linux"));

        let link = f.cached.join("jars").join("loop");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from(".."));
        assert_eq!(
            fs::read_to_string(f.cached.join("jars").join("lib.jar")).unwrap(),
            "jar"
        );
    }
}
