//! Preflight and repository checks.

use tracing::{debug, info, warn};
use vership_config::CONFIG_FILE_NAME;
use vership_git::Vcs;

use super::{Stage, StageOutcome};
use crate::context::RunContext;
use crate::error::PreconditionFailed;
use crate::pipeline::Services;
use crate::{CoreError, CoreResult};

/// Checks that git can be run and returns its version banner.
///
/// # Errors
///
/// Returns [`CoreError::ToolUnavailable`] if `git` cannot be executed.
pub async fn preflight(vcs: &dyn Vcs) -> CoreResult<String> {
    let banner = vcs
        .version()
        .await
        .map_err(|source| CoreError::ToolUnavailable {
            tool: "git".to_string(),
            source,
        })?;
    debug!(%banner, "found git");
    Ok(banner)
}

/// Fails before any change if the release stage could not publish.
fn check_publishing(ctx: &RunContext, services: &Services) -> CoreResult<()> {
    let ready = if ctx.repository.is_none() {
        Err(CoreError::UnknownRepository)
    } else {
        services.publisher.check().map_err(CoreError::from)
    };
    match ready {
        Err(err) if ctx.is_dry_run() => {
            warn!(error = %err, "release could not be published");
            Ok(())
        }
        other => other,
    }
}

pub(super) async fn run(ctx: &RunContext, services: &Services) -> CoreResult<StageOutcome> {
    if !ctx.skips(Stage::Changelog) && !ctx.config_path.as_ref().is_some_and(|p| p.is_file()) {
        return Err(PreconditionFailed::MissingConfig(CONFIG_FILE_NAME.to_string()).into());
    }

    if !ctx.skips(Stage::Release) {
        check_publishing(ctx, services)?;
    }

    if ctx.is_dry_run() {
        info!("dry run, skipping repository checks");
        return Ok(StageOutcome::new(ctx.clone()));
    }

    let vcs = services.vcs.as_ref();
    if !vcs.is_inside_work_tree().await? {
        return Err(PreconditionFailed::NotAWorkTree(services.workdir.clone()).into());
    }

    let git = &ctx.config.git;
    if git.require_branch {
        let branch = vcs.current_branch().await?;
        if !git.branches.contains(&branch) {
            return Err(PreconditionFailed::BranchNotAllowed {
                branch,
                allowed: git.branches.clone(),
            }
            .into());
        }
    }

    if git.require_clean_working_dir && !vcs.is_clean().await? {
        return Err(PreconditionFailed::DirtyWorkingTree.into());
    }

    if git.require_upstream && vcs.upstream().await?.is_none() {
        let branch = vcs.current_branch().await?;
        return Err(PreconditionFailed::NoUpstream(branch).into());
    }

    Ok(StageOutcome::new(ctx.clone()))
}
