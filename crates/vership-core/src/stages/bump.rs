//! Manifest version rewriting.

use tracing::{info, warn};

use super::StageOutcome;
use crate::CoreResult;
use crate::context::RunContext;
use crate::ledger::{ManifestVersion, RollbackAction};
use crate::pipeline::Services;

pub(super) fn run(ctx: &RunContext, services: &Services) -> CoreResult<StageOutcome> {
    let next = ctx.require_next_version()?;

    if ctx.is_dry_run() {
        for path in &ctx.manifests {
            info!(
                path = %path.display(),
                from = %ctx.current_version,
                to = %next,
                "would update manifest"
            );
        }
        return Ok(StageOutcome::new(ctx.clone()));
    }

    let mut previous: Vec<ManifestVersion> = Vec::with_capacity(ctx.manifests.len());
    for path in &ctx.manifests {
        let full = services.path(path);
        let written = services.manifests.read(&full).and_then(|manifest| {
            services
                .manifests
                .write_version(&full, next)
                .map(|()| manifest.version)
        });

        match written {
            Ok(version) => {
                info!(path = %path.display(), from = %version, to = %next, "updated manifest");
                previous.push(ManifestVersion {
                    path: path.clone(),
                    version,
                });
            }
            Err(err) => {
                restore(services, &previous);
                return Err(err.into());
            }
        }
    }

    Ok(StageOutcome::new(ctx.clone())
        .with_rollback(RollbackAction::RestoreManifests { files: previous }))
}

/// Puts back manifests already rewritten when a later one fails.
fn restore(services: &Services, written: &[ManifestVersion]) {
    for file in written.iter().rev() {
        if let Err(err) = services
            .manifests
            .write_version(&services.path(&file.path), &file.version)
        {
            warn!(path = %file.path.display(), error = %err, "failed to restore manifest");
        }
    }
}

/// Skipped bump: the release keeps the current version.
pub(super) fn keep_current(ctx: &RunContext) -> CoreResult<StageOutcome> {
    let context = if ctx.next_version().is_some() {
        ctx.clone()
    } else {
        ctx.clone()
            .with_next_version(ctx.current_version.clone())?
    };
    Ok(StageOutcome::new(context))
}
