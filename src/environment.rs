//! Job environment and inputs
//!
//! Everything the cache lifecycle learns about the running job comes through
//! here: runner metadata from well-known environment variables, and named
//! inputs layered from the command line, `INPUT_*` variables and the config
//! file.

use crate::cache::KeyEnvironment;
use std::collections::HashMap;
use std::env;

/// Overrides every cache key in the run
pub const KEY_PREFIX_VAR: &str = "CACHE_KEY_PREFIX";
/// Runner operating system
pub const RUNNER_OS_VAR: &str = "RUNNER_OS";
/// Current job id
pub const JOB_VAR: &str = "GITHUB_JOB";
/// Commit being built
pub const SHA_VAR: &str = "GITHUB_SHA";

/// Input carrying the job context descriptor
pub const JOB_CONTEXT_INPUT: &str = "workflow-job-context";

const INPUT_VAR_PREFIX: &str = "INPUT_";

/// Normalize an input name the way runners name input variables
fn input_key(name: &str) -> String {
    name.replace(' ', "_").to_uppercase()
}

/// Input values lose surrounding whitespace, like runner-provided inputs
fn input_value(value: &str) -> String {
    value.trim().to_string()
}

/// Named job inputs, resolved once per invocation
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    values: HashMap<String, String>,
}

impl Inputs {
    /// Resolve inputs from the process environment
    ///
    /// Precedence: `overrides` (command line), then `INPUT_<NAME>` variables,
    /// then the config file table. Values are trimmed.
    pub fn resolve(config: &HashMap<String, String>, overrides: &[(String, String)]) -> Self {
        Self::resolve_with(env::vars(), config, overrides)
    }

    /// Resolve inputs from an explicit set of environment variables
    pub fn resolve_with(
        vars: impl IntoIterator<Item = (String, String)>,
        config: &HashMap<String, String>,
        overrides: &[(String, String)],
    ) -> Self {
        let mut values: HashMap<String, String> = config
            .iter()
            .map(|(name, value)| (input_key(name), input_value(value)))
            .collect();

        for (var, value) in vars {
            if let Some(name) = var.strip_prefix(INPUT_VAR_PREFIX) {
                values.insert(input_key(name), input_value(&value));
            }
        }

        for (name, value) in overrides {
            values.insert(input_key(name), input_value(value));
        }

        Self { values }
    }

    /// Build inputs directly from name/value pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(name, value)| (input_key(name), input_value(value)))
                .collect(),
        }
    }

    /// Look up an input by name
    pub fn get(&self, name: &str) -> Option<String> {
        self.values.get(&input_key(name)).cloned()
    }
}

impl KeyEnvironment {
    /// Read the key environment from process variables and inputs
    ///
    /// `default_prefix` comes from the config file and applies only when
    /// `CACHE_KEY_PREFIX` is unset or empty.
    pub fn from_env(inputs: &Inputs, default_prefix: Option<&str>) -> Self {
        Self::from_lookup(|name| env::var(name).ok(), inputs, default_prefix)
    }

    /// Read the key environment through an arbitrary variable lookup
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        inputs: &Inputs,
        default_prefix: Option<&str>,
    ) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        Self {
            prefix: var(KEY_PREFIX_VAR)
                .or_else(|| default_prefix.map(str::to_string))
                .unwrap_or_default(),
            os: var(RUNNER_OS_VAR).unwrap_or_default(),
            job: var(JOB_VAR).unwrap_or_default(),
            context_descriptor: inputs.get(JOB_CONTEXT_INPUT).unwrap_or_default(),
            sha: var(SHA_VAR).unwrap_or_default(),
        }
    }
}
