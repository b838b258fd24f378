//! Save command - save caches at the end of a job

use super::JobContext;
use crate::cache::{CacheController, CachePolicyGate, SaveOutcome};
use crate::cli::args::{GlobalArgs, PhaseArgs};
use crate::config::Config;
use crate::error::CacheResult;
use console::style;

/// Execute the save command
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
        let outcome = controller.save(&*output).await?;

        let marker = match outcome {
            SaveOutcome::Saved { .. } => style("✓").green(),
            SaveOutcome::SavedWithWarning { .. } => style("!").yellow(),
            _ => style("-").dim(),
        };
        println!("{} {}: {}", marker, kind, outcome);
    }

    Ok(())
}
