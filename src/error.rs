//! Error types for gradle-cache
//!
//! All modules use `CacheResult<T>` as their return type. Only configuration
//! and store validation errors are meant to fail a job; everything else that
//! goes wrong with caching is downgraded to a warning by the lifecycle.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gradle-cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in gradle-cache
#[derive(Error, Debug)]
pub enum CacheError {
    // Configuration errors
    #[error("Invalid cache-enabled parameter '{value}'. Valid values are ['true', 'false', 'read-only']")]
    ConfigInvalid { input: String, value: String },

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    #[error("Unknown cache name: {0}")]
    UnknownCache(String),

    // Store errors
    #[error("Cache validation failed: {0}")]
    StoreValidation(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => {
                Some("Set the input to one of: true, false, read-only (case-insensitive)")
            }
            Self::UnknownCache(_) => Some("Known caches are: wrapper, dependencies"),
            Self::StoreValidation(_) => {
                Some("Check that the cached paths exist and the cache key is under 512 characters without commas")
            }
            _ => None,
        }
    }
}
