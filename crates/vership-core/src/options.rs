//! Run options gathered from the command line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResolutionError;
use crate::stages::Stage;
use crate::{CoreError, CoreResult};

/// Semver increment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    /// `1.2.3` -> `2.0.0`
    Major,
    /// `1.2.3` -> `1.3.0`
    Minor,
    /// `1.2.3` -> `1.2.4`
    Patch,
    /// `1.2.3` -> `2.0.0-alpha.0`
    PreMajor,
    /// `1.2.3` -> `1.3.0-alpha.0`
    PreMinor,
    /// `1.2.3` -> `1.2.4-alpha.0`
    PrePatch,
    /// `1.2.4-alpha.0` -> `1.2.4-alpha.1`
    PreRelease,
}

impl ReleaseType {
    /// Every release type, in the order they are offered interactively.
    pub const ALL: [Self; 7] = [
        Self::Major,
        Self::Minor,
        Self::Patch,
        Self::PreMajor,
        Self::PreMinor,
        Self::PrePatch,
        Self::PreRelease,
    ];

    /// The pre-release family.
    pub const PRERELEASE: [Self; 4] = [
        Self::PreMajor,
        Self::PreMinor,
        Self::PrePatch,
        Self::PreRelease,
    ];

    /// Returns the lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::PreMajor => "premajor",
            Self::PreMinor => "preminor",
            Self::PrePatch => "prepatch",
            Self::PreRelease => "prerelease",
        }
    }

    /// Returns true for the pre-release family.
    #[must_use]
    pub fn is_prerelease(self) -> bool {
        Self::PRERELEASE.contains(&self)
    }

    /// Maps a stable level to its pre-release counterpart.
    #[must_use]
    pub fn to_prerelease(self) -> Self {
        match self {
            Self::Major => Self::PreMajor,
            Self::Minor => Self::PreMinor,
            Self::Patch => Self::PrePatch,
            other => other,
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|release| release.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ResolutionError::InvalidReleaseType(s.to_string()))
    }
}

/// Starting point of the numeric pre-release counter.
///
/// `next`, `canary` and `nightly` are channel bases: they disable the numeric
/// counter, so `1.2.3` with identifier `next` becomes `1.2.4-next`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreReleaseBase {
    /// Counter starts at 0.
    #[default]
    #[serde(rename = "0")]
    Zero,
    /// Counter starts at 1.
    #[serde(rename = "1")]
    One,
    /// Channel base.
    Next,
    /// Channel base.
    Canary,
    /// Channel base.
    Nightly,
}

impl PreReleaseBase {
    /// Returns the counter start, or `None` for channel bases.
    #[must_use]
    pub fn numeric(self) -> Option<u64> {
        match self {
            Self::Zero => Some(0),
            Self::One => Some(1),
            Self::Next | Self::Canary | Self::Nightly => None,
        }
    }

    /// Returns the textual form accepted on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Next => "next",
            Self::Canary => "canary",
            Self::Nightly => "nightly",
        }
    }
}

impl fmt::Display for PreReleaseBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreReleaseBase {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" => Ok(Self::Zero),
            "1" => Ok(Self::One),
            "next" => Ok(Self::Next),
            "canary" => Ok(Self::Canary),
            "nightly" => Ok(Self::Nightly),
            _ => Err(ResolutionError::InvalidBase(s.to_string())),
        }
    }
}

/// How the next version is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpStrategy {
    /// Derived from conventional commits since the last tag.
    Auto,
    /// Given explicitly or chosen interactively.
    Manual,
}

impl fmt::Display for BumpStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        })
    }
}

impl FromStr for BumpStrategy {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            _ => Err(ResolutionError::InvalidStrategy(s.to_string())),
        }
    }
}

/// Per-stage skip switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipFlags {
    /// Skip version resolution and manifest rewriting.
    pub bump: bool,
    /// Skip the changelog stage.
    pub changelog: bool,
    /// Skip the release commit.
    pub commit: bool,
    /// Skip tag creation.
    pub tag: bool,
    /// Skip pushing the branch.
    pub push: bool,
    /// Skip pushing the tag.
    pub push_tag: bool,
    /// Skip publishing the hosted release.
    pub release: bool,
}

/// Flags forwarded to the hosted release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubReleaseFlags {
    /// Create the release as a draft.
    pub draft: bool,
    /// Mark the release as a pre-release.
    pub prerelease: bool,
    /// Mark the release as the latest one.
    pub latest: bool,
}

/// Options for one pipeline run. Immutable once the run starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Describe every action without changing anything.
    pub dry_run: bool,
    /// Print captured command output on failure.
    pub verbose: bool,
    /// Never prompt.
    pub ci: bool,
    /// Package name override for templates.
    pub name: Option<String>,
    /// Explicit strategy; derived from `ci` and `release_type` when absent.
    pub bump_strategy: Option<BumpStrategy>,
    /// Explicit release type.
    pub release_type: Option<ReleaseType>,
    /// Pre-release identifier; `alpha` when absent.
    pub pre_release_id: Option<String>,
    /// Pre-release counter base.
    pub pre_release_base: PreReleaseBase,
    /// Per-stage skips.
    pub skip: SkipFlags,
    /// Rewrite manifests only.
    pub bump_only: bool,
    /// Rewrite manifests and the changelog only.
    pub bump_only_with_changelog: bool,
    /// Hosted release flags.
    pub github_release: GithubReleaseFlags,
}

impl Options {
    /// Identifier used when none is supplied.
    pub const DEFAULT_PRE_RELEASE_ID: &'static str = "alpha";

    /// Returns the effective pre-release identifier.
    #[must_use]
    pub fn pre_release_id(&self) -> &str {
        self.pre_release_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(Self::DEFAULT_PRE_RELEASE_ID)
    }

    /// Returns the strategy the version stage uses.
    ///
    /// An explicit strategy wins. In CI mode without a stable release type the
    /// strategy is automatic, everything else is manual.
    #[must_use]
    pub fn strategy(&self) -> BumpStrategy {
        match self.bump_strategy {
            Some(strategy) => strategy,
            None if self.ci
                && matches!(self.release_type, None | Some(ReleaseType::PreRelease)) =>
            {
                BumpStrategy::Auto
            }
            None => BumpStrategy::Manual,
        }
    }

    /// Rejects contradictory combinations.
    ///
    /// The GitHub release flags are pairwise exclusive: a draft is accepted
    /// on its own and does not require `--github-release-prerelease`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOptions`] naming the conflict.
    pub fn validate(&self) -> CoreResult<()> {
        let flags = self.github_release;
        let set: Vec<&str> = [
            (flags.draft, "--github-release-draft"),
            (flags.prerelease, "--github-release-prerelease"),
            (flags.latest, "--github-release-latest"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        if set.len() > 1 {
            return Err(CoreError::InvalidOptions(format!(
                "{} cannot be combined",
                set.join(" and ")
            )));
        }

        if self.bump_only && self.bump_only_with_changelog {
            return Err(CoreError::InvalidOptions(
                "--bump-only and --bump-only-with-changelog cannot be combined".to_string(),
            ));
        }

        if let Some(id) = self.pre_release_id.as_deref().filter(|id| !id.is_empty())
            && semver::Prerelease::new(id).is_err()
        {
            return Err(ResolutionError::InvalidIdentifier(id.to_string()).into());
        }

        Ok(())
    }

    /// Returns true if the options alone turn `stage` off.
    #[must_use]
    pub fn skips(&self, stage: Stage) -> bool {
        let publish_off = self.bump_only || self.bump_only_with_changelog;
        match stage {
            Stage::Verify => false,
            Stage::Version | Stage::Bump => self.skip.bump,
            Stage::Changelog => self.skip.changelog || self.bump_only,
            Stage::Commit => self.skip.commit || publish_off,
            Stage::Tag => self.skip.tag || publish_off,
            Stage::Push => (self.skip.push && self.skip.push_tag) || publish_off,
            Stage::Release => self.skip.release || publish_off,
        }
    }
}
