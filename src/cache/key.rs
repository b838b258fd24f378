//! Hierarchical cache key derivation
//!
//! A key is built in tiers, each one extending the previous:
//!
//! | Tier | Shape |
//! |------|-------|
//! | OS | `{prefix}{cache}\|{os}` |
//! | Job | `{os tier}\|{job}` |
//! | Context | `{job tier}[{context token}]` |
//! | Exact | `{context tier}-{sha}` |
//!
//! The exact key is tried first on restore, then the context, job and OS
//! tiers in that order. Restores never fall back across operating systems.

use super::context::resolve_job_context;
use serde::Serialize;
use tracing::debug;

/// Inputs the key builder depends on
///
/// Every field may be empty; a missing job name or commit still yields a
/// usable (if less specific) key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEnvironment {
    /// Process-wide prefix prepended to every key
    pub prefix: String,
    /// Runner operating system (e.g. "Linux")
    pub os: String,
    /// Job identifier within the workflow
    pub job: String,
    /// Free-form descriptor of the job context, hashed into the key
    pub context_descriptor: String,
    /// Commit being built
    pub sha: String,
}

/// A primary cache key plus its ordered fallbacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheKey {
    /// Most specific key, includes the commit SHA
    pub key: String,
    /// Fallback keys, most specific first
    pub restore_keys: Vec<String>,
}

/// Build the cache key for a cache name in the given environment
pub fn build_key(cache_name: &str, env: &KeyEnvironment) -> CacheKey {
    debug!(
        "Creating cache key with job context: {}",
        env.context_descriptor
    );

    let key_for_os = format!("{}{}|{}", env.prefix, cache_name, env.os);
    let key_for_job = format!("{}|{}", key_for_os, env.job);
    let key_for_context = format!(
        "{}[{}]",
        key_for_job,
        resolve_job_context(&env.context_descriptor)
    );
    let key = format!("{}-{}", key_for_context, env.sha);

    CacheKey {
        key,
        restore_keys: vec![key_for_context, key_for_job, key_for_os],
    }
}
