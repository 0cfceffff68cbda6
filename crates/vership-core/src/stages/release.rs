//! Hosted release publishing.

use tracing::info;

use super::StageOutcome;
use crate::context::RunContext;
use crate::pipeline::Services;
use crate::publish::ReleaseRequest;
use crate::{CoreError, CoreResult};

pub(super) async fn run(ctx: &RunContext, services: &Services) -> CoreResult<StageOutcome> {
    let flags = ctx.options.github_release;
    let tag = ctx.tag_name()?;

    if ctx.is_dry_run() {
        info!(
            repository = ctx.repository.as_deref().unwrap_or("unknown"),
            %tag,
            draft = flags.draft,
            prerelease = flags.prerelease,
            "would publish release"
        );
        return Ok(StageOutcome::new(ctx.clone()));
    }

    let request = ReleaseRequest {
        repository: ctx
            .repository
            .clone()
            .ok_or(CoreError::UnknownRepository)?,
        tag,
        title: ctx.render(&ctx.config.github.release.title)?,
        body: ctx.changelog.clone().unwrap_or_default(),
        draft: flags.draft,
        prerelease: flags.prerelease,
        make_latest: flags.latest,
    };
    let url = services.publisher.publish(&request).await?;
    info!(%url, "published release");

    Ok(StageOutcome::new(ctx.clone()))
}
