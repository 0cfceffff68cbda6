//! Next-version stage.

use tracing::info;

use super::StageOutcome;
use crate::CoreResult;
use crate::context::RunContext;
use crate::pipeline::Services;
use crate::version::VersionResolver;

pub(super) async fn run(ctx: &RunContext, services: &Services) -> CoreResult<StageOutcome> {
    let resolver = VersionResolver::new(services.vcs.as_ref(), services.prompter.as_ref());
    let next = resolver.resolve(ctx).await?;
    info!(current = %ctx.current_version, %next, "resolved next version");
    Ok(StageOutcome::new(ctx.clone().with_next_version(next)?))
}
