//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// gradle-cache - Gradle caching for CI jobs
///
/// Restores Gradle dependency and wrapper caches at the start of a job and
/// saves them at the end, keyed by OS, job, job context and commit.
#[derive(Parser, Debug)]
#[command(name = "gradle-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GRADLE_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// File carrying state from restore to save
    #[arg(long, global = true, env = "GRADLE_CACHE_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Root directory of the cache store
    #[arg(long, global = true, env = "GRADLE_CACHE_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Job input (NAME=VALUE), e.g. wrapper-cache-enabled=read-only
    #[arg(short, long = "input", global = true, value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// Log output format
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore caches at the start of a job
    Restore(PhaseArgs),

    /// Save caches at the end of a job
    Save(PhaseArgs),

    /// Print the cache key for a cache
    Key(KeyArgs),
}

/// Arguments for the restore and save commands
#[derive(Parser, Debug)]
pub struct PhaseArgs {
    /// Caches to process (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "wrapper,dependencies")]
    pub caches: Vec<String>,

    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Gradle user home (defaults to GRADLE_USER_HOME or ~/.gradle)
    #[arg(long)]
    pub gradle_user_home: Option<PathBuf>,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Cache name (wrapper, dependencies)
    pub cache: String,

    /// Output format
    #[arg(short, long, default_value = "plain")]
    pub format: OutputFormat,
}

/// Output format for the key command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Key followed by restore keys, one per line
    Plain,
    /// JSON output
    Json,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Parse a job input in NAME=VALUE format
fn parse_input(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid NAME=VALUE format: no '=' found in '{s}'"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}
