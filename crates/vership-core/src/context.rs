//! Per-run state threaded through the stages.

use std::path::PathBuf;

use semver::Version;
use serde::Serialize;
use vership_config::{Config, TemplateVars, render};

use crate::CoreResult;
use crate::error::ResolutionError;
use crate::manifest::Manifest;
use crate::options::Options;
use crate::stages::Stage;

/// State of one pipeline run.
///
/// Stages never mutate a context in place: every `with_*` method consumes
/// the value and returns the updated copy, so a context handed to the
/// rollback ledger stays exactly as it was at registration.
#[derive(Debug, Clone, Serialize)]
pub struct RunContext {
    /// Options given for this run.
    pub options: Options,

    /// Effective configuration.
    pub config: Config,

    /// The configuration file in effect, `None` when defaults are used.
    pub config_path: Option<PathBuf>,

    /// Package name used for `{{name}}`.
    pub name: String,

    /// Version read from the primary manifest.
    pub current_version: Version,

    next_version: Option<Version>,

    /// Changelog section generated for this release.
    pub changelog: Option<String>,

    /// `owner/repo` of the hosting repository.
    pub repository: Option<String>,

    /// Most recent version tag before this release.
    pub previous_tag: Option<String>,

    /// Manifests to rewrite, relative to the working directory.
    pub manifests: Vec<PathBuf>,
}

impl RunContext {
    /// Creates a context with no manifest data yet.
    #[must_use]
    pub fn new(options: Options, config: Config) -> Self {
        let name = options.name.clone().unwrap_or_default();
        Self {
            options,
            config,
            config_path: None,
            name,
            current_version: Version::new(0, 0, 0),
            next_version: None,
            changelog: None,
            repository: None,
            previous_tag: None,
            manifests: Vec::new(),
        }
    }

    /// Records the configuration file in effect.
    #[must_use]
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Takes the current version and, unless overridden, the package name
    /// from the primary manifest.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Manifest, manifests: Vec<PathBuf>) -> Self {
        if self.name.is_empty() {
            self.name = manifest.name.unwrap_or_default();
        }
        self.current_version = manifest.version;
        self.manifests = manifests;
        self
    }

    /// Records the hosting repository slug.
    #[must_use]
    pub fn with_repository(mut self, repository: Option<String>) -> Self {
        self.repository = repository;
        self
    }

    /// Records the previous version tag.
    #[must_use]
    pub fn with_previous_tag(mut self, tag: Option<String>) -> Self {
        self.previous_tag = tag;
        self
    }

    /// Records the generated changelog section.
    #[must_use]
    pub fn with_changelog(mut self, changelog: String) -> Self {
        self.changelog = Some(changelog);
        self
    }

    /// Sets the next version.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::AlreadyResolved`] if it was set before.
    pub fn with_next_version(mut self, version: Version) -> CoreResult<Self> {
        if let Some(existing) = self.next_version {
            return Err(ResolutionError::AlreadyResolved(existing).into());
        }
        self.next_version = Some(version);
        Ok(self)
    }

    /// Returns the next version, if resolved.
    #[must_use]
    pub fn next_version(&self) -> Option<&Version> {
        self.next_version.as_ref()
    }

    /// Returns the next version.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Unresolved`] before the version stage ran.
    pub fn require_next_version(&self) -> CoreResult<&Version> {
        self.next_version
            .as_ref()
            .ok_or_else(|| ResolutionError::Unresolved.into())
    }

    /// Renders a template against the next version and package name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Unresolved`] before the version stage ran.
    pub fn render(&self, template: &str) -> CoreResult<String> {
        let version = self.require_next_version()?.to_string();
        Ok(render(
            template,
            TemplateVars {
                version: &version,
                name: &self.name,
            },
        ))
    }

    /// Returns the release tag name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Unresolved`] before the version stage ran.
    pub fn tag_name(&self) -> CoreResult<String> {
        self.render(&self.config.git.tag_name)
    }

    /// Returns true if `stage` does nothing in this run.
    #[must_use]
    pub fn skips(&self, stage: Stage) -> bool {
        if self.options.skips(stage) {
            return true;
        }
        match stage {
            Stage::Changelog => !self.config.changelog.enabled,
            Stage::Release => !self.config.github.release.enabled,
            _ => false,
        }
    }

    /// Returns true if no mutation may happen.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }
}
