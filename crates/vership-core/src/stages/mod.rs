//! Pipeline stages.
//!
//! Each stage reads the current [`RunContext`], performs its side effects
//! through [`Services`] and returns the updated context together with the
//! compensations for whatever it changed.

mod bump;
mod changelog;
mod commit;
mod push;
mod release;
mod tag;
mod verify;
mod version;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CoreResult;
use crate::context::RunContext;
use crate::ledger::RollbackAction;
use crate::pipeline::Services;

pub use verify::preflight;

/// The steps of a release, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Repository and configuration checks.
    Verify,
    /// Next-version resolution.
    Version,
    /// Manifest rewriting.
    Bump,
    /// Changelog generation.
    Changelog,
    /// Release commit.
    Commit,
    /// Release tag.
    Tag,
    /// Branch and tag push.
    Push,
    /// Hosted release.
    Release,
}

impl Stage {
    /// All stages in execution order.
    pub const ORDER: [Self; 8] = [
        Self::Verify,
        Self::Version,
        Self::Bump,
        Self::Changelog,
        Self::Commit,
        Self::Tag,
        Self::Push,
        Self::Release,
    ];

    /// Returns the lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::Version => "version",
            Self::Bump => "bump",
            Self::Changelog => "changelog",
            Self::Commit => "commit",
            Self::Tag => "tag",
            Self::Push => "push",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful stage.
#[derive(Debug)]
pub struct StageOutcome {
    /// Context for the next stage.
    pub context: RunContext,
    /// Compensations for the changes made, in the order they were made.
    pub rollback: Vec<RollbackAction>,
}

impl StageOutcome {
    /// An outcome without side effects.
    #[must_use]
    pub fn new(context: RunContext) -> Self {
        Self {
            context,
            rollback: Vec::new(),
        }
    }

    /// Adds a compensation.
    #[must_use]
    pub fn with_rollback(mut self, action: RollbackAction) -> Self {
        self.rollback.push(action);
        self
    }
}

/// Runs one stage, honoring skip flags and configuration switches.
pub(crate) async fn run(
    stage: Stage,
    ctx: &RunContext,
    services: &Services,
) -> CoreResult<StageOutcome> {
    if ctx.skips(stage) {
        info!(%stage, "skipped");
        return match stage {
            Stage::Bump => bump::keep_current(ctx),
            _ => Ok(StageOutcome::new(ctx.clone())),
        };
    }

    info!(%stage, dry_run = ctx.is_dry_run(), "running");
    match stage {
        Stage::Verify => verify::run(ctx, services).await,
        Stage::Version => version::run(ctx, services).await,
        Stage::Bump => bump::run(ctx, services),
        Stage::Changelog => changelog::run(ctx, services).await,
        Stage::Commit => commit::run(ctx, services).await,
        Stage::Tag => tag::run(ctx, services).await,
        Stage::Push => push::run(ctx, services).await,
        Stage::Release => release::run(ctx, services).await,
    }
}
