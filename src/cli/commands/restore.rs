//! Restore command - restore caches at the start of a job

use super::JobContext;
use crate::cache::{CacheController, CachePolicyGate, RestoreOutcome};
use crate::cli::args::{GlobalArgs, PhaseArgs};
use crate::config::Config;
use crate::error::CacheResult;
use console::style;

/// Execute the restore command
pub async fn execute(args: PhaseArgs, global: &GlobalArgs, config: &Config) -> CacheResult<()> {
    let ctx = JobContext::resolve(global, &args, config)?;
    let controller = CacheController::new(
        CachePolicyGate::new(&ctx.inputs),
        &ctx.key_env,
        &ctx.store,
        &ctx.state,
    );

    for kind in &ctx.caches {
        let output = kind.output(&ctx.gradle_user_home, &ctx.project_dir);
        let outcome = controller.restore(&*output).await?;

        let marker = match outcome {
            RestoreOutcome::Restored { .. } => style("✓").green(),
            RestoreOutcome::Miss => style("•").yellow(),
            _ => style("-").dim(),
        };
        println!("{} {}: {}", marker, kind, outcome);
    }

    Ok(())
}
