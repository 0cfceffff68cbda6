//! Rollback ledger.
//!
//! Every mutating stage registers how to undo what it did. When a later stage
//! fails the ledger is unwound newest first; if one compensation fails the
//! remaining ones are abandoned and a single hard reset runs instead.

use std::path::PathBuf;

use async_trait::async_trait;
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::RunContext;
use crate::stages::Stage;
use crate::{CoreError, CoreResult};

/// A manifest path and the version it declared before the bump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestVersion {
    /// Manifest path, relative to the working directory.
    pub path: PathBuf,
    /// Version to restore.
    pub version: Version,
}

/// How to undo one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RollbackAction {
    /// Write the previous versions back and unstage the manifests.
    RestoreManifests {
        /// Previous versions.
        files: Vec<ManifestVersion>,
    },
    /// Restore the changelog from `HEAD`, or delete it if it was new.
    RevertChangelog {
        /// Changelog path, relative to the working directory.
        path: PathBuf,
        /// Whether `HEAD` has the file.
        tracked: bool,
    },
    /// Drop the release commit, keeping its changes staged.
    ResetCommit,
    /// Delete the local tag.
    DeleteTag {
        /// Tag name.
        tag: String,
    },
    /// Move the remote branch back to where it was.
    ResetRemoteBranch {
        /// Remote name.
        remote: String,
        /// Branch name.
        branch: String,
        /// Commit the branch pointed to, `None` if the push created it.
        previous: Option<String>,
    },
    /// Delete the tag locally and on the remote.
    DeleteRemoteTag {
        /// Remote name.
        remote: String,
        /// Tag name.
        tag: String,
    },
}

impl RollbackAction {
    /// Returns a one-line description for logs and reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::RestoreManifests { files } => {
                let list: Vec<String> = files
                    .iter()
                    .map(|f| format!("{} to {}", f.path.display(), f.version))
                    .collect();
                format!("restore {}", list.join(", "))
            }
            Self::RevertChangelog { path, tracked: true } => {
                format!("restore {} from HEAD", path.display())
            }
            Self::RevertChangelog {
                path,
                tracked: false,
            } => format!("remove {}", path.display()),
            Self::ResetCommit => "reset the release commit".to_string(),
            Self::DeleteTag { tag } => format!("delete tag {tag}"),
            Self::ResetRemoteBranch {
                remote,
                branch,
                previous: Some(previous),
            } => format!("reset {remote}/{branch} to {previous}"),
            Self::ResetRemoteBranch {
                remote,
                branch,
                previous: None,
            } => format!("delete {remote}/{branch}"),
            Self::DeleteRemoteTag { remote, tag } => format!("delete tag {tag} on {remote}"),
        }
    }
}

/// A registered compensation.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackEntry {
    /// Stage that registered the entry.
    pub stage: Stage,
    /// The undo operation.
    pub action: RollbackAction,
    /// Human-readable description.
    pub description: String,
    /// Context as it was when the entry was registered.
    pub snapshot: RunContext,
}

/// Executes compensations.
#[async_trait]
pub trait Compensator: Send + Sync {
    /// Undoes one entry.
    async fn compensate(&self, entry: &RollbackEntry) -> CoreResult<()>;

    /// Last-resort cleanup after a compensation failed.
    async fn fallback(&self) -> CoreResult<()>;
}

/// What happened while unwinding.
#[derive(Debug)]
pub enum RollbackReport {
    /// Nothing was registered.
    Nothing,
    /// Every entry was compensated.
    Completed {
        /// Descriptions of undone entries, in execution order.
        undone: Vec<String>,
    },
    /// A compensation failed and the fallback ran.
    Fallback {
        /// Entries undone before the failure.
        undone: Vec<String>,
        /// The entry whose compensation failed.
        failed: String,
        /// Why it failed.
        error: CoreError,
        /// Error of the fallback itself, if any.
        fallback_error: Option<CoreError>,
    },
}

impl RollbackReport {
    /// Returns true if the repository is back to its pre-run state.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        match self {
            Self::Nothing | Self::Completed { .. } => true,
            Self::Fallback { fallback_error, .. } => fallback_error.is_none(),
        }
    }
}

/// Ordered list of compensations for one run.
#[derive(Debug, Default)]
pub struct RollbackLedger {
    entries: Vec<RollbackEntry>,
}

impl RollbackLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an undo operation with a snapshot of `context`.
    pub fn register(&mut self, stage: Stage, action: RollbackAction, context: &RunContext) {
        let description = action.describe();
        info!(%stage, %description, "registered rollback");
        self.entries.push(RollbackEntry {
            stage,
            action,
            description,
            snapshot: context.clone(),
        });
    }

    /// Registered entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[RollbackEntry] {
        &self.entries
    }

    /// Compensates every entry, newest first.
    ///
    /// Stops at the first failing compensation and runs the compensator's
    /// fallback exactly once. Consumes the ledger so it cannot run twice.
    pub async fn unwind(self, compensator: &dyn Compensator) -> RollbackReport {
        if self.entries.is_empty() {
            return RollbackReport::Nothing;
        }

        let mut undone = Vec::with_capacity(self.entries.len());
        for entry in self.entries.into_iter().rev() {
            info!(stage = %entry.stage, description = %entry.description, "rolling back");
            if let Err(error) = compensator.compensate(&entry).await {
                warn!(
                    stage = %entry.stage,
                    description = %entry.description,
                    %error,
                    "rollback failed, resetting working tree"
                );
                let fallback_error = compensator.fallback().await.err();
                if let Some(err) = &fallback_error {
                    warn!(error = %err, "hard reset failed");
                }
                return RollbackReport::Fallback {
                    undone,
                    failed: entry.description,
                    error,
                    fallback_error,
                };
            }
            undone.push(entry.description);
        }

        RollbackReport::Completed { undone }
    }
}
