//! Core error types.

use std::path::PathBuf;

use semver::Version;
use thiserror::Error;
use vership_config::ConfigError;
use vership_git::GitError;

use crate::manifest::ManifestError;
use crate::options::ReleaseType;
use crate::publish::PublishError;

/// Version resolution errors.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The custom version could not be interpreted.
    #[error("invalid semver format: {0:?}")]
    InvalidFormat(String),

    /// The candidate does not move the version forward.
    #[error("version {candidate} must be higher than current version {current}")]
    NotHigher {
        /// Rejected candidate.
        candidate: Version,
        /// Version read from the manifest.
        current: Version,
    },

    /// Incrementing the current version is impossible.
    #[error("cannot apply {release} to {version}: {reason}")]
    IncrementFailed {
        /// Version being incremented.
        version: Version,
        /// Requested release type.
        release: ReleaseType,
        /// Why the increment failed.
        reason: String,
    },

    /// The pre-release identifier is not a valid semver pre-release.
    #[error("invalid pre-release identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Unknown pre-release base.
    #[error("unknown pre-release base {0:?} (expected 0, 1, next, canary or nightly)")]
    InvalidBase(String),

    /// Unknown release type.
    #[error("unknown release type {0:?}")]
    InvalidReleaseType(String),

    /// Unknown bump strategy.
    #[error("unknown bump strategy {0:?} (expected auto or manual)")]
    InvalidStrategy(String),

    /// A stage needed the next version before it was resolved.
    #[error("next version has not been resolved")]
    Unresolved,

    /// The next version was assigned twice.
    #[error("next version is already resolved to {0}")]
    AlreadyResolved(Version),
}

/// Repository and configuration checks that run before any mutation.
#[derive(Debug, Error)]
pub enum PreconditionFailed {
    /// No configuration file although the changelog stage needs one.
    #[error("configuration file not found; run `vership init` to create {0}")]
    MissingConfig(String),

    /// The working directory is not inside a git work tree.
    #[error("not inside a git work tree: {0}")]
    NotAWorkTree(PathBuf),

    /// The current branch is not an allowed release branch.
    #[error("branch {branch:?} is not a release branch (allowed: {})", allowed.join(", "))]
    BranchNotAllowed {
        /// Checked-out branch.
        branch: String,
        /// Configured release branches.
        allowed: Vec<String>,
    },

    /// The working tree has uncommitted changes.
    #[error("working tree has uncommitted changes")]
    DirtyWorkingTree,

    /// The current branch has no upstream.
    #[error("branch {0:?} has no upstream branch")]
    NoUpstream(String),
}

/// Core-related errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Contradictory or malformed options.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// A required external tool could not be run.
    #[error("{tool} is not available")]
    ToolUnavailable {
        /// Tool name.
        tool: String,
        /// Underlying failure.
        #[source]
        source: GitError,
    },

    /// A repository check failed.
    #[error(transparent)]
    Precondition(#[from] PreconditionFailed),

    /// Version resolution failed.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Git error.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// Manifest error.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Release publishing error.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Interactive input failed or is unavailable.
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// No manifest to read the current version from.
    #[error("no Cargo.toml or package.json found in {0}")]
    NoManifest(PathBuf),

    /// The release stage needs an `owner/repo` slug.
    #[error("repository could not be determined from the remote; set git.repository")]
    UnknownRepository,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Returns the captured output of a failed external command, if any.
    #[must_use]
    pub fn command_output(&self) -> Option<&str> {
        match self {
            Self::Git(err) | Self::ToolUnavailable { source: err, .. } => err.command_output(),
            _ => None,
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
