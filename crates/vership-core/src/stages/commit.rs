//! Release commit.

use std::path::PathBuf;

use tracing::info;

use super::{Stage, StageOutcome};
use crate::CoreResult;
use crate::context::RunContext;
use crate::ledger::RollbackAction;
use crate::pipeline::Services;

/// Files changed by the stages that ran.
fn release_files(ctx: &RunContext) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if !ctx.skips(Stage::Bump) {
        paths.extend(ctx.manifests.iter().cloned());
    }
    if !ctx.skips(Stage::Changelog) {
        paths.push(PathBuf::from(&ctx.config.changelog.path));
    }
    paths
}

pub(super) async fn run(ctx: &RunContext, services: &Services) -> CoreResult<StageOutcome> {
    let message = ctx.render(&ctx.config.git.commit_message)?;
    let paths = release_files(ctx);

    if paths.is_empty() {
        info!("nothing to commit");
        return Ok(StageOutcome::new(ctx.clone()));
    }

    if ctx.is_dry_run() {
        info!(%message, files = paths.len(), "would commit");
        return Ok(StageOutcome::new(ctx.clone()));
    }

    services.vcs.add(&paths).await?;
    services.vcs.commit(&message).await?;
    info!(%message, "created release commit");

    Ok(StageOutcome::new(ctx.clone()).with_rollback(RollbackAction::ResetCommit))
}
