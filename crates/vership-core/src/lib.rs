//! Release pipeline for vership.
//!
//! This crate provides the pieces of a release run:
//! - [`Pipeline`]: drives the [`Stage`]s from verification to the hosted release
//! - [`RunContext`]: the state handed from stage to stage
//! - [`VersionResolver`]: automatic and interactive next-version selection
//! - [`RollbackLedger`]: compensations replayed when a stage fails

mod changelog;
mod context;
mod error;
mod ledger;
mod manifest;
mod options;
mod pipeline;
mod prompt;
mod publish;
mod stages;
mod version;

#[cfg(test)]
mod testing;

pub use changelog::{
    CHANGELOG_HEADER, ChangelogGenerator, KeepAChangelog, ReleaseNotes, prepend_section,
};
pub use context::RunContext;
pub use error::{CoreError, CoreResult, PreconditionFailed, ResolutionError};
pub use ledger::{
    Compensator, ManifestVersion, RollbackAction, RollbackEntry, RollbackLedger, RollbackReport,
};
pub use manifest::{
    FileManifests, MANIFEST_CANDIDATES, Manifest, ManifestError, ManifestResult, ManifestStore,
    detect_manifests,
};
pub use options::{
    BumpStrategy, GithubReleaseFlags, Options, PreReleaseBase, ReleaseType, SkipFlags,
};
pub use pipeline::{Pipeline, PipelineFailure, Services};
pub use prompt::{NonInteractive, Prompter};
pub use publish::{GithubPublisher, PublishError, PublishResult, ReleasePublisher, ReleaseRequest};
pub use stages::{Stage, StageOutcome, preflight};
pub use version::{BumpRecommendation, VersionResolver, increment_version, normalize_custom};
