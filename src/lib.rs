//! gradle-cache - Gradle caching for CI jobs
//!
//! Restores Gradle dependency caches and wrapper distributions when a job
//! starts and saves them when it ends, using hierarchical keys that fall back
//! to older caches for the same OS, job and job context.

pub mod cache;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;

pub use error::{CacheError, CacheResult};
