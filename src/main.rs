//! gradle-cache - Gradle caching for CI jobs
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use gradle_cache::cli::{Cli, Commands, LogFormat};
use gradle_cache::config::ConfigManager;
use gradle_cache::error::CacheResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.global.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = info, 1 = debug, 2+ = trace
    let filter = match cli.global.verbose {
        0 => EnvFilter::new("gradle_cache=info"),
        1 => EnvFilter::new("gradle_cache=debug"),
        _ => EnvFilter::new("gradle_cache=trace"),
    };
    let log_format = cli.global.log_format.unwrap_or(
        if config.general.log_format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
    );

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.without_time().init(),
    }

    // Dispatch to command
    match cli.command {
        Commands::Restore(args) => {
            gradle_cache::cli::commands::restore(args, &cli.global, &config).await
        }
        Commands::Save(args) => gradle_cache::cli::commands::save(args, &cli.global, &config).await,
        Commands::Key(args) => gradle_cache::cli::commands::key(args, &cli.global, &config).await,
    }
}
