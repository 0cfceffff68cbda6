//! Release pipeline.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info};
use vership_git::{GitError, Vcs, repository_slug};

use crate::changelog::ChangelogGenerator;
use crate::context::RunContext;
use crate::ledger::{Compensator, RollbackAction, RollbackEntry, RollbackLedger, RollbackReport};
use crate::manifest::{ManifestStore, detect_manifests};
use crate::prompt::Prompter;
use crate::publish::ReleasePublisher;
use crate::stages::{self, Stage, preflight};
use crate::{CoreError, CoreResult};

/// External collaborators of a run.
pub struct Services {
    /// Project root; relative paths in the context resolve against it.
    pub workdir: PathBuf,
    /// Version control.
    pub vcs: Box<dyn Vcs>,
    /// Manifest access.
    pub manifests: Box<dyn ManifestStore>,
    /// Changelog rendering.
    pub changelog: Box<dyn ChangelogGenerator>,
    /// Hosted releases.
    pub publisher: Box<dyn ReleasePublisher>,
    /// Interactive input.
    pub prompter: Box<dyn Prompter>,
}

impl Services {
    /// Resolves `path` against the working directory.
    #[must_use]
    pub fn path(&self, path: &Path) -> PathBuf {
        self.workdir.join(path)
    }
}

/// A run that stopped at a stage.
#[derive(Debug, Error)]
#[error("release failed at the {stage} stage")]
pub struct PipelineFailure {
    /// The stage that failed.
    pub stage: Stage,
    /// Root cause.
    #[source]
    pub error: CoreError,
    /// Context as it was when the stage started.
    pub context: Box<RunContext>,
    /// What the rollback did.
    pub rollback: RollbackReport,
}

impl PipelineFailure {
    fn before_changes(stage: Stage, error: CoreError, context: RunContext) -> Self {
        Self {
            stage,
            error,
            context: Box::new(context),
            rollback: RollbackReport::Nothing,
        }
    }
}

/// Undoes ledger entries through the run's services.
pub(crate) struct ServiceCompensator<'a> {
    services: &'a Services,
}

impl<'a> ServiceCompensator<'a> {
    pub(crate) fn new(services: &'a Services) -> Self {
        Self { services }
    }

    pub(crate) async fn undo(&self, action: &RollbackAction) -> CoreResult<()> {
        let vcs = self.services.vcs.as_ref();
        match action {
            RollbackAction::RestoreManifests { files } => {
                for file in files {
                    self.services
                        .manifests
                        .write_version(&self.services.path(&file.path), &file.version)?;
                }
                let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
                vcs.unstage(&paths).await?;
            }
            RollbackAction::RevertChangelog {
                path,
                tracked: true,
            } => vcs.restore_from_head(path).await?,
            RollbackAction::RevertChangelog {
                path,
                tracked: false,
            } => {
                vcs.unstage(std::slice::from_ref(path)).await?;
                match fs::remove_file(self.services.path(path)) {
                    Err(err) if err.kind() != ErrorKind::NotFound => return Err(err.into()),
                    _ => {}
                }
            }
            RollbackAction::ResetCommit => vcs.reset_soft("HEAD~1").await?,
            RollbackAction::DeleteTag { tag } => {
                if vcs.tag_exists(tag).await? {
                    vcs.delete_tag(tag).await?;
                }
            }
            RollbackAction::ResetRemoteBranch {
                remote,
                branch,
                previous: Some(previous),
            } => {
                vcs.push(remote, &format!("{previous}:refs/heads/{branch}"), true)
                    .await?;
            }
            RollbackAction::ResetRemoteBranch {
                remote,
                branch,
                previous: None,
            } => vcs.push(remote, &format!(":refs/heads/{branch}"), false).await?,
            RollbackAction::DeleteRemoteTag { remote, tag } => {
                if vcs.tag_exists(tag).await? {
                    vcs.delete_tag(tag).await?;
                }
                vcs.push(remote, &format!(":refs/tags/{tag}"), false).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Compensator for ServiceCompensator<'_> {
    async fn compensate(&self, entry: &RollbackEntry) -> CoreResult<()> {
        debug!(
            stage = %entry.stage,
            version = ?entry.snapshot.next_version(),
            "compensating"
        );
        self.undo(&entry.action).await
    }

    async fn fallback(&self) -> CoreResult<()> {
        Ok(self.services.vcs.hard_reset().await?)
    }
}

/// Drives a release through every stage.
pub struct Pipeline {
    services: Services,
}

impl Pipeline {
    /// Creates a pipeline over the given collaborators.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Fills in the manifest version, package name, repository slug and
    /// previous tag.
    ///
    /// # Errors
    ///
    /// Returns an error if no manifest can be read or git fails.
    pub async fn enrich(&self, ctx: RunContext) -> CoreResult<RunContext> {
        let workdir = &self.services.workdir;
        let manifests: Vec<PathBuf> = if ctx.config.version.files.is_empty() {
            detect_manifests(workdir)
        } else {
            ctx.config.version.files.iter().map(PathBuf::from).collect()
        };
        let primary = manifests
            .first()
            .ok_or_else(|| CoreError::NoManifest(workdir.clone()))?;
        let manifest = self.services.manifests.read(&self.services.path(primary))?;
        let ctx = ctx.with_manifest(manifest, manifests);

        let vcs = self.services.vcs.as_ref();
        let (prefix, suffix) = ctx.config.git.tag_affixes(&ctx.name);
        let previous_tag = match vcs.latest_version_tag(&prefix, &suffix).await {
            Ok(tag) => tag,
            // Reported by the verify stage.
            Err(GitError::NotARepo(_)) => None,
            Err(err) => return Err(err.into()),
        };

        let repository = if ctx.config.git.detects_repository() {
            let host = ctx.config.github.web_host();
            vcs.remote_url(&ctx.config.git.remote)
                .await?
                .and_then(|url| repository_slug(&url, &host))
        } else {
            Some(ctx.config.git.repository.clone())
        };

        info!(
            name = %ctx.name,
            current = %ctx.current_version,
            previous_tag = previous_tag.as_deref().unwrap_or("none"),
            repository = repository.as_deref().unwrap_or("unknown"),
            "prepared release"
        );
        Ok(ctx.with_previous_tag(previous_tag).with_repository(repository))
    }

    /// Runs every stage in order.
    ///
    /// On failure the rollback ledger is unwound before returning.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineFailure`] naming the failed stage and its cause.
    pub async fn run(&self, ctx: RunContext) -> Result<RunContext, Box<PipelineFailure>> {
        if let Err(err) = ctx.options.validate() {
            return Err(Box::new(PipelineFailure::before_changes(
                Stage::Verify,
                err,
                ctx,
            )));
        }

        if let Err(err) = preflight(self.services.vcs.as_ref()).await {
            return Err(Box::new(PipelineFailure::before_changes(
                Stage::Verify,
                err,
                ctx,
            )));
        }

        let mut ctx = match self.enrich(ctx.clone()).await {
            Ok(enriched) => enriched,
            Err(err) => {
                return Err(Box::new(PipelineFailure::before_changes(
                    Stage::Verify,
                    err,
                    ctx,
                )));
            }
        };

        let mut ledger = RollbackLedger::new();
        for stage in Stage::ORDER {
            match stages::run(stage, &ctx, &self.services).await {
                Ok(outcome) => {
                    ctx = outcome.context;
                    for action in outcome.rollback {
                        ledger.register(stage, action, &ctx);
                    }
                }
                Err(err) => {
                    error!(%stage, error = %err, "stage failed");
                    let rollback = ledger
                        .unwind(&ServiceCompensator::new(&self.services))
                        .await;
                    return Err(Box::new(PipelineFailure {
                        stage,
                        error: err,
                        context: Box::new(ctx),
                        rollback,
                    }));
                }
            }
        }

        if let Some(version) = ctx.next_version() {
            info!(%version, dry_run = ctx.is_dry_run(), "release finished");
        }
        Ok(ctx)
    }
}
