//! The Gradle directories worth caching
//!
//! Each kind knows where its output lives and whether it is already present.
//! The lifecycle is generic over [`CacheOutput`] and never needs to know
//! which kind it is handling.

use crate::error::{CacheError, CacheResult};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Relative location of the wrapper properties inside a project
pub const WRAPPER_PROPERTIES: &str = "gradle/wrapper/gradle-wrapper.properties";

/// A cacheable output of a Gradle build
pub trait CacheOutput: Send + Sync {
    /// Logical cache name used in keys, inputs and job state
    fn cache_name(&self) -> &str;

    /// Human readable name for log lines
    fn description(&self) -> &str;

    /// Whether the output is already present on disk
    fn output_exists(&self) -> bool;

    /// Paths to restore into and save from
    fn cache_paths(&self) -> Vec<PathBuf>;
}

/// Known cache names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Downloaded wrapper distribution
    Wrapper,
    /// Resolved dependencies under `caches/`
    Dependencies,
}

impl CacheKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wrapper => "wrapper",
            Self::Dependencies => "dependencies",
        }
    }

    /// Parse a cache name
    pub fn parse(name: &str) -> CacheResult<Self> {
        match name {
            "wrapper" => Ok(Self::Wrapper),
            "dependencies" => Ok(Self::Dependencies),
            _ => Err(CacheError::UnknownCache(name.to_string())),
        }
    }

    /// Build the output for this kind
    pub fn output(&self, gradle_user_home: &Path, project_dir: &Path) -> Box<dyn CacheOutput> {
        match self {
            Self::Wrapper => Box::new(WrapperCache::new(gradle_user_home, project_dir)),
            Self::Dependencies => Box::new(DependenciesCache::new(gradle_user_home)),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolve the Gradle user home: explicit, then `GRADLE_USER_HOME`, then `~/.gradle`
///
/// Callers fold the command line and config file values into `explicit`.
pub fn gradle_user_home(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os("GRADLE_USER_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gradle")
}

/// `<gradle-user-home>/caches`
#[derive(Debug, Clone)]
pub struct DependenciesCache {
    path: PathBuf,
}

impl DependenciesCache {
    pub fn new(gradle_user_home: &Path) -> Self {
        Self {
            path: gradle_user_home.join("caches"),
        }
    }
}

impl CacheOutput for DependenciesCache {
    fn cache_name(&self) -> &str {
        "dependencies"
    }

    fn description(&self) -> &str {
        "Gradle dependencies"
    }

    fn output_exists(&self) -> bool {
        self.path.is_dir()
    }

    fn cache_paths(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }
}

/// The unpacked distribution the project's wrapper points at
#[derive(Debug, Clone)]
pub struct WrapperCache {
    dists_dir: PathBuf,
    distribution: Option<String>,
}

impl WrapperCache {
    pub fn new(gradle_user_home: &Path, project_dir: &Path) -> Self {
        let distribution = read_distribution_name(&project_dir.join(WRAPPER_PROPERTIES));
        debug!("Wrapper distribution: {:?}", distribution);
        Self {
            dists_dir: gradle_user_home.join("wrapper").join("dists"),
            distribution,
        }
    }

    fn path(&self) -> PathBuf {
        match &self.distribution {
            Some(name) => self.dists_dir.join(name),
            None => self.dists_dir.clone(),
        }
    }
}

impl CacheOutput for WrapperCache {
    fn cache_name(&self) -> &str {
        "wrapper"
    }

    fn description(&self) -> &str {
        "Gradle wrapper distribution"
    }

    fn output_exists(&self) -> bool {
        self.path().is_dir()
    }

    fn cache_paths(&self) -> Vec<PathBuf> {
        vec![self.path()]
    }
}

/// Distribution name from a wrapper properties file, e.g. `gradle-6.7.1-bin`
fn read_distribution_name(properties: &Path) -> Option<String> {
    let content = fs::read_to_string(properties).ok()?;
    let url = parse_properties_value(&content, "distributionUrl")?;
    distribution_name(&url)
}

/// Find a key in Java properties content, undoing `\:` and `\=` escapes
fn parse_properties_value(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with('!'))
        .find_map(|line| {
            let (name, value) = line.split_once('=').or_else(|| line.split_once(':'))?;
            (name.trim() == key).then(|| value.trim().replace("\\:", ":").replace("\\=", "="))
        })
}

/// Last path segment of the distribution URL without its `.zip` extension
fn distribution_name(url: &str) -> Option<String> {
    let file = url.rsplit('/').next()?;
    let name = file.strip_suffix(".zip").unwrap_or(file);
    (!name.is_empty()).then(|| name.to_string())
}
