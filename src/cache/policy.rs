//! Per-cache read/write policy

use crate::environment::Inputs;
use crate::error::{CacheError, CacheResult};
use std::fmt;

/// Value used when a `<cache>-cache-enabled` input is not set anywhere
pub const DEFAULT_POLICY_VALUE: &str = "true";

/// Input name controlling a cache
pub fn policy_input_name(cache_name: &str) -> String {
    format!("{}-cache-enabled", cache_name)
}

/// What a job may do with a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Restore and save ("true")
    Enabled,
    /// Restore only ("read-only")
    ReadOnly,
    /// Neither ("false")
    Disabled,
}

impl CachePolicy {
    /// Parse a raw input value, case-insensitively
    pub fn parse(input: &str, value: &str) -> CacheResult<Self> {
        let normalized = value.to_lowercase();
        match normalized.as_str() {
            "true" => Ok(Self::Enabled),
            "read-only" => Ok(Self::ReadOnly),
            "false" => Ok(Self::Disabled),
            _ => Err(CacheError::ConfigInvalid {
                input: input.to_string(),
                value: normalized,
            }),
        }
    }

    /// Whether a restore may read from the cache
    pub fn can_read(&self) -> bool {
        matches!(self, Self::Enabled | Self::ReadOnly)
    }

    /// Whether a save may write to the cache
    pub fn can_write(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "true"),
            Self::ReadOnly => write!(f, "read-only"),
            Self::Disabled => write!(f, "false"),
        }
    }
}

/// Resolves cache policies from job inputs
#[derive(Debug, Clone, Copy)]
pub struct CachePolicyGate<'a> {
    inputs: &'a Inputs,
}

impl<'a> CachePolicyGate<'a> {
    pub fn new(inputs: &'a Inputs) -> Self {
        Self { inputs }
    }

    /// Read and validate the policy for a cache name
    pub fn read_policy(&self, cache_name: &str) -> CacheResult<CachePolicy> {
        let input = policy_input_name(cache_name);
        let value = self
            .inputs
            .get(&input)
            .unwrap_or_else(|| DEFAULT_POLICY_VALUE.to_string());
        CachePolicy::parse(&input, &value)
    }

    pub fn can_read(&self, cache_name: &str) -> CacheResult<bool> {
        Ok(self.read_policy(cache_name)?.can_read())
    }

    pub fn can_write(&self, cache_name: &str) -> CacheResult<bool> {
        Ok(self.read_policy(cache_name)?.can_write())
    }
}
