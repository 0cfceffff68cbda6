//! Branch and tag push.

use tracing::{info, warn};

use super::{Stage, StageOutcome};
use crate::CoreResult;
use crate::context::RunContext;
use crate::ledger::RollbackAction;
use crate::pipeline::{ServiceCompensator, Services};

pub(super) async fn run(ctx: &RunContext, services: &Services) -> CoreResult<StageOutcome> {
    let vcs = services.vcs.as_ref();
    let remote = ctx.config.git.remote.clone();
    let branch = vcs.current_branch().await?;
    let tag = ctx.tag_name()?;

    let push_branch = !ctx.options.skip.push;
    // No tag to push when the tag stage did not create one.
    let push_tag = !ctx.options.skip.push_tag && !ctx.skips(Stage::Tag);

    if ctx.is_dry_run() {
        if push_branch {
            info!(%remote, %branch, "would push branch");
        }
        if push_tag {
            info!(%remote, %tag, "would push tag");
        }
        return Ok(StageOutcome::new(ctx.clone()));
    }

    let mut outcome = StageOutcome::new(ctx.clone());

    if push_branch {
        let previous = vcs.remote_head(&remote, &branch).await?;
        vcs.push(&remote, &format!("HEAD:refs/heads/{branch}"), false)
            .await?;
        info!(%remote, %branch, "pushed branch");
        outcome = outcome.with_rollback(RollbackAction::ResetRemoteBranch {
            remote: remote.clone(),
            branch,
            previous,
        });
    }

    if push_tag {
        if let Err(err) = vcs.push(&remote, &format!("refs/tags/{tag}"), false).await {
            // The stage fails as a whole, so undo the branch push here.
            let compensator = ServiceCompensator::new(services);
            for action in outcome.rollback.iter().rev() {
                if let Err(undo_err) = compensator.undo(action).await {
                    warn!(action = %action.describe(), error = %undo_err, "failed to undo push");
                }
            }
            return Err(err.into());
        }
        info!(%remote, %tag, "pushed tag");
        outcome = outcome.with_rollback(RollbackAction::DeleteRemoteTag { remote, tag });
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::testing::Harness;

    #[tokio::test]
    async fn test_pushes_branch_then_tag() {
        let harness = Harness::new();
        let outcome = run(&harness.resolved(Options::default()), &harness.services())
            .await
            .unwrap();

        assert_eq!(
            harness.vcs.mutations(),
            vec![
                "push origin HEAD:refs/heads/main",
                "push origin refs/tags/v1.3.0"
            ]
        );
        assert_eq!(
            outcome.rollback,
            vec![
                RollbackAction::ResetRemoteBranch {
                    remote: "origin".to_string(),
                    branch: "main".to_string(),
                    previous: Some("abc1234".to_string()),
                },
                RollbackAction::DeleteRemoteTag {
                    remote: "origin".to_string(),
                    tag: "v1.3.0".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_skip_push_tag_only_pushes_branch() {
        let harness = Harness::new();
        let mut options = Options::default();
        options.skip.push_tag = true;

        run(&harness.resolved(options), &harness.services())
            .await
            .unwrap();
        assert_eq!(
            harness.vcs.mutations(),
            vec!["push origin HEAD:refs/heads/main"]
        );
    }

    #[tokio::test]
    async fn test_tag_push_failure_undoes_branch_push() {
        let harness = Harness::new();
        harness
            .vcs
            .update(|s| s.fail_on = Some("push origin refs/tags".to_string()));

        let result = run(&harness.resolved(Options::default()), &harness.services()).await;
        assert!(result.is_err());
        assert_eq!(
            harness.vcs.mutations(),
            vec![
                "push origin HEAD:refs/heads/main",
                "push --force origin abc1234:refs/heads/main"
            ]
        );
    }
}
