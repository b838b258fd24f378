//! CLI command implementations

mod key;
mod restore;
mod save;

pub use key::execute as key;
pub use restore::execute as restore;
pub use save::execute as save;

use crate::cache::{gradle_user_home, CacheKind, FileStateStore, KeyEnvironment, LocalDirStore};
use crate::cli::args::{GlobalArgs, PhaseArgs};
use crate::config::{Config, ConfigManager};
use crate::environment::Inputs;
use crate::error::{CacheError, CacheResult};
use std::path::PathBuf;
use tracing::debug;

/// Everything a restore or save invocation needs, resolved once
pub struct JobContext {
    pub inputs: Inputs,
    pub key_env: KeyEnvironment,
    pub store: LocalDirStore,
    pub state: FileStateStore,
    pub gradle_user_home: PathBuf,
    pub project_dir: PathBuf,
    pub caches: Vec<CacheKind>,
}

impl JobContext {
    /// Resolve the job context from command line, environment and config
    pub fn resolve(global: &GlobalArgs, args: &PhaseArgs, config: &Config) -> CacheResult<Self> {
        let caches = args
            .caches
            .iter()
            .map(|name| CacheKind::parse(name.trim()))
            .collect::<CacheResult<Vec<_>>>()?;

        let inputs = Inputs::resolve(&config.inputs, &global.inputs);
        let key_env = KeyEnvironment::from_env(&inputs, config.cache.key_prefix.as_deref());

        let store_dir = global
            .store_dir
            .clone()
            .or_else(|| config.cache.store_dir.clone())
            .unwrap_or_else(ConfigManager::default_store_dir);
        let state_file = global
            .state_file
            .clone()
            .or_else(|| config.cache.state_file.clone())
            .unwrap_or_else(ConfigManager::default_state_file);

        let explicit_home = args
            .gradle_user_home
            .clone()
            .or_else(|| config.cache.gradle_user_home.clone());
        let gradle_user_home = gradle_user_home(explicit_home.as_deref());

        let project_dir = match &args.project {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .map_err(|e| CacheError::io("getting current directory", e))?,
        };

        debug!("Store directory: {}", store_dir.display());
        debug!("State file: {}", state_file.display());
        debug!("Gradle user home: {}", gradle_user_home.display());

        Ok(Self {
            inputs,
            key_env,
            store: LocalDirStore::new(store_dir),
            state: FileStateStore::new(state_file),
            gradle_user_home,
            project_dir,
            caches,
        })
    }
}
