//! Release tag.

use tracing::info;

use super::StageOutcome;
use crate::CoreResult;
use crate::context::RunContext;
use crate::ledger::RollbackAction;
use crate::pipeline::Services;

pub(super) async fn run(ctx: &RunContext, services: &Services) -> CoreResult<StageOutcome> {
    let tag = ctx.tag_name()?;
    let annotation = ctx.render(&ctx.config.git.tag_annotation)?;
    let signed = services.vcs.signing_key().await?.is_some();

    if ctx.is_dry_run() {
        info!(%tag, signed, "would create tag");
        return Ok(StageOutcome::new(ctx.clone()));
    }

    services.vcs.create_tag(&tag, &annotation, signed).await?;
    info!(%tag, signed, "created tag");

    Ok(StageOutcome::new(ctx.clone()).with_rollback(RollbackAction::DeleteTag { tag }))
}
