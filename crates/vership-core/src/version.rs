//! Next-version resolution.
//!
//! Increments follow npm's semver rules: a pre-release of the same line is
//! promoted by a stable bump (`2.0.0-alpha.1` -> major -> `2.0.0`) and the
//! pre-release family appends or advances a `<identifier>.<n>` suffix.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use semver::{Prerelease, Version};
use tracing::{debug, info};
use vership_commit::{ConventionalParser, ParsedCommit};
use vership_git::Vcs;

use crate::context::RunContext;
use crate::error::ResolutionError;
use crate::options::{BumpStrategy, PreReleaseBase, ReleaseType};
use crate::prompt::Prompter;
use crate::{CoreError, CoreResult};

static DANGLING_PRERELEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+\.\d+\.\d+)-((?:[0-9A-Za-z-]+\.)*[A-Za-z-][0-9A-Za-z-]*)\.?$")
        .expect("invalid regex")
});

static COERCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{1,16})(?:\.(\d{1,16}))?(?:\.(\d{1,16}))?(?:$|[^\d])")
        .expect("invalid regex")
});

static TRAILING_PRERELEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)").expect("invalid regex")
});

const OVERFLOW: &str = "version component overflow";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Identifier {
    Numeric(u64),
    Alphanumeric(String),
}

impl Identifier {
    fn parse(part: &str) -> Self {
        if !part.is_empty()
            && part.bytes().all(|b| b.is_ascii_digit())
            && let Ok(n) = part.parse()
        {
            return Self::Numeric(n);
        }
        Self::Alphanumeric(part.to_string())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Alphanumeric(s) => f.write_str(s),
        }
    }
}

/// Mutable version used while applying increment steps.
struct Draft {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Vec<Identifier>,
}

fn next(n: u64) -> Result<u64, &'static str> {
    n.checked_add(1).ok_or(OVERFLOW)
}

impl Draft {
    fn new(version: &Version) -> Self {
        let pre = if version.pre.is_empty() {
            Vec::new()
        } else {
            version.pre.as_str().split('.').map(Identifier::parse).collect()
        };
        Self {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
            pre,
        }
    }

    fn pre_string(&self) -> String {
        self.pre
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn major(&mut self) -> Result<(), &'static str> {
        if self.minor != 0 || self.patch != 0 || self.pre.is_empty() {
            self.major = next(self.major)?;
        }
        self.minor = 0;
        self.patch = 0;
        self.pre.clear();
        Ok(())
    }

    fn minor(&mut self) -> Result<(), &'static str> {
        if self.patch != 0 || self.pre.is_empty() {
            self.minor = next(self.minor)?;
        }
        self.patch = 0;
        self.pre.clear();
        Ok(())
    }

    fn patch(&mut self) -> Result<(), &'static str> {
        if self.pre.is_empty() {
            self.patch = next(self.patch)?;
        }
        self.pre.clear();
        Ok(())
    }

    fn apply(
        &mut self,
        release: ReleaseType,
        identifier: &str,
        base: Option<u64>,
    ) -> Result<(), &'static str> {
        match release {
            ReleaseType::Major => self.major(),
            ReleaseType::Minor => self.minor(),
            ReleaseType::Patch => self.patch(),
            ReleaseType::PreMajor => {
                self.pre.clear();
                self.patch = 0;
                self.minor = 0;
                self.major = next(self.major)?;
                self.advance_pre(identifier, base)
            }
            ReleaseType::PreMinor => {
                self.pre.clear();
                self.patch = 0;
                self.minor = next(self.minor)?;
                self.advance_pre(identifier, base)
            }
            ReleaseType::PrePatch => {
                self.pre.clear();
                self.patch()?;
                self.advance_pre(identifier, base)
            }
            ReleaseType::PreRelease => {
                if self.pre.is_empty() {
                    self.patch()?;
                }
                self.advance_pre(identifier, base)
            }
        }
    }

    /// Advances the pre-release counter, then switches to `identifier`'s
    /// line when it differs from the current one.
    fn advance_pre(&mut self, identifier: &str, base: Option<u64>) -> Result<(), &'static str> {
        let start = base.unwrap_or(0);
        if self.pre.is_empty() {
            self.pre.push(Identifier::Numeric(start));
        } else if let Some(n) = self.pre.iter_mut().rev().find_map(|id| match id {
            Identifier::Numeric(n) => Some(n),
            Identifier::Alphanumeric(_) => None,
        }) {
            *n = next(*n)?;
        } else {
            if base.is_none() && self.pre_string() == identifier {
                return Err("identifier already exists");
            }
            self.pre.push(Identifier::Numeric(start));
        }

        if !identifier.is_empty() {
            let mut fresh = vec![Identifier::Alphanumeric(identifier.to_string())];
            if let Some(start) = base {
                fresh.push(Identifier::Numeric(start));
            }
            let same_line = self
                .pre
                .first()
                .is_some_and(|first| first.to_string() == identifier);
            let counted = matches!(self.pre.get(1), Some(Identifier::Numeric(_)));
            if !same_line || !counted {
                self.pre = fresh;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Version, String> {
        let mut version = Version::new(self.major, self.minor, self.patch);
        if !self.pre.is_empty() {
            version.pre = Prerelease::new(&self.pre_string()).map_err(|e| e.to_string())?;
        }
        Ok(version)
    }
}

/// Applies `release` to `current`.
///
/// `identifier` names the pre-release line (`alpha`, `beta`, ...). `base`
/// selects the first counter value; channel bases drop the counter.
///
/// # Errors
///
/// Returns [`ResolutionError::InvalidIdentifier`] for a malformed identifier
/// and [`ResolutionError::IncrementFailed`] when the increment has no result.
pub fn increment_version(
    current: &Version,
    release: ReleaseType,
    identifier: &str,
    base: PreReleaseBase,
) -> Result<Version, ResolutionError> {
    let fail = |reason: &str| ResolutionError::IncrementFailed {
        version: current.clone(),
        release,
        reason: reason.to_string(),
    };
    let base = base.numeric();

    if release.is_prerelease() {
        if identifier.is_empty() && base.is_none() {
            return Err(fail("identifier is empty"));
        }
        if !identifier.is_empty() && Prerelease::new(identifier).is_err() {
            return Err(ResolutionError::InvalidIdentifier(identifier.to_string()));
        }
    }

    let mut draft = Draft::new(current);
    draft.apply(release, identifier, base).map_err(fail)?;
    draft.finish().map_err(|reason| fail(&reason))
}

/// Interprets a user-typed version.
///
/// Exact semver is used as-is. A dangling pre-release (`2.0.0-beta.`,
/// `v2.0.0-rc`) gets a `.0` counter. Anything else is coerced from its first
/// `x[.y[.z]]` number group, keeping a pre-release that directly follows it.
///
/// # Errors
///
/// Returns [`ResolutionError::InvalidFormat`] when no version can be found.
pub fn normalize_custom(input: &str) -> Result<Version, ResolutionError> {
    let trimmed = input.trim();
    let invalid = || ResolutionError::InvalidFormat(trimmed.to_string());

    if let Ok(version) = Version::parse(trimmed) {
        return Ok(version);
    }

    if let Some(caps) = DANGLING_PRERELEASE_RE.captures(trimmed) {
        return Version::parse(&format!("{}-{}.0", &caps[1], &caps[2])).map_err(|_| invalid());
    }

    let caps = COERCE_RE.captures(trimmed).ok_or_else(invalid)?;
    let component = |index: usize| -> Result<u64, ResolutionError> {
        caps.get(index)
            .map_or(Ok(0), |m| m.as_str().parse())
            .map_err(|_| invalid())
    };
    let mut version = Version::new(component(1)?, component(2)?, component(3)?);

    let digits_end = (1..=3)
        .filter_map(|index| caps.get(index))
        .map(|m| m.end())
        .max()
        .unwrap_or_default();
    if let Some(tail) = TRAILING_PRERELEASE_RE.captures(&trimmed[digits_end..]) {
        version.pre = Prerelease::new(&tail[1]).map_err(|_| invalid())?;
    }

    Ok(version)
}

/// Commit statistics that drive automatic bumps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BumpRecommendation {
    /// Number of breaking-change notes.
    pub breaking: usize,
    /// Number of `feat` commits.
    pub features: usize,
}

impl BumpRecommendation {
    /// Tallies breaking notes and features.
    #[must_use]
    pub fn from_commits(commits: &[ParsedCommit]) -> Self {
        commits.iter().fold(Self::default(), |mut acc, commit| {
            acc.breaking += commit.breaking_notes().count();
            if commit.is_feature() {
                acc.features += 1;
            }
            acc
        })
    }

    /// Breaking changes are major, features minor, anything else patch.
    #[must_use]
    pub fn release_type(self) -> ReleaseType {
        if self.breaking > 0 {
            ReleaseType::Major
        } else if self.features > 0 {
            ReleaseType::Minor
        } else {
            ReleaseType::Patch
        }
    }
}

/// Computes the next version of a run.
pub struct VersionResolver<'a> {
    vcs: &'a dyn Vcs,
    prompter: &'a dyn Prompter,
}

impl<'a> VersionResolver<'a> {
    /// Creates a resolver reading history from `vcs` and asking `prompter`.
    #[must_use]
    pub fn new(vcs: &'a dyn Vcs, prompter: &'a dyn Prompter) -> Self {
        Self { vcs, prompter }
    }

    /// Applies `release` to the current version with the run's pre-release
    /// identifier and base.
    ///
    /// # Errors
    ///
    /// Returns a resolution error when the increment has no result.
    pub fn increment(&self, ctx: &RunContext, release: ReleaseType) -> CoreResult<Version> {
        Ok(increment_version(
            &ctx.current_version,
            release,
            ctx.options.pre_release_id(),
            ctx.options.pre_release_base,
        )?)
    }

    /// Derives the release type from commits since the previous tag.
    ///
    /// # Errors
    ///
    /// Returns an error if history cannot be read or the increment fails.
    pub async fn auto_resolve(&self, ctx: &RunContext) -> CoreResult<Version> {
        let commits = self.vcs.commits_since(ctx.previous_tag.as_deref()).await?;
        let parsed = ConventionalParser::new().parse_all(&commits);
        let recommendation = BumpRecommendation::from_commits(&parsed);

        let explicit_id = ctx
            .options
            .pre_release_id
            .as_deref()
            .is_some_and(|id| !id.is_empty());
        let release = if ctx.options.release_type == Some(ReleaseType::PreRelease) {
            ReleaseType::PreRelease
        } else if explicit_id {
            recommendation.release_type().to_prerelease()
        } else {
            recommendation.release_type()
        };

        info!(
            commits = parsed.len(),
            breaking = recommendation.breaking,
            features = recommendation.features,
            %release,
            "derived release type from history"
        );
        self.increment(ctx, release)
    }

    /// Uses the explicit release type, or asks which one to apply.
    ///
    /// # Errors
    ///
    /// Returns an error if prompting is impossible, the answer is invalid or
    /// the chosen version is not higher than the current one.
    pub async fn manual_resolve(&self, ctx: &RunContext) -> CoreResult<Version> {
        let requested = ctx.options.release_type;
        if let Some(release) = requested.filter(|r| *r != ReleaseType::PreRelease) {
            return self.increment(ctx, release);
        }
        if ctx.options.ci {
            return Err(CoreError::Prompt(
                "a release type is required when running with --ci".to_string(),
            ));
        }

        let family: &[ReleaseType] = if requested.is_some() {
            &ReleaseType::PRERELEASE
        } else {
            &ReleaseType::ALL
        };
        let mut candidates: Vec<(ReleaseType, Version)> = family
            .iter()
            .filter_map(|&release| match self.increment(ctx, release) {
                Ok(version) => Some((release, version)),
                Err(err) => {
                    debug!(%release, %err, "release type not applicable");
                    None
                }
            })
            .collect();

        let mut labels: Vec<String> = candidates
            .iter()
            .map(|(release, version)| format!("{release} ({version})"))
            .collect();
        labels.push("custom".to_string());

        let message = format!("Select release type (current: {})", ctx.current_version);
        let choice = self.prompter.select(&message, &labels)?;
        if choice < candidates.len() {
            return Ok(candidates.swap_remove(choice).1);
        }
        if choice > candidates.len() {
            return Err(CoreError::Prompt(format!("invalid choice {choice}")));
        }

        let input = self.prompter.input("Custom version")?;
        if input.trim().is_empty() {
            return self.auto_resolve(ctx).await;
        }
        ensure_higher(ctx, normalize_custom(&input)?)
    }

    /// Resolves the next version with the run's strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails or the result is not higher than
    /// the current version.
    pub async fn resolve(&self, ctx: &RunContext) -> CoreResult<Version> {
        let strategy = ctx.options.strategy();
        debug!(%strategy, current = %ctx.current_version, "resolving next version");
        let version = match strategy {
            BumpStrategy::Auto => self.auto_resolve(ctx).await?,
            BumpStrategy::Manual => self.manual_resolve(ctx).await?,
        };
        ensure_higher(ctx, version)
    }
}

fn ensure_higher(ctx: &RunContext, candidate: Version) -> CoreResult<Version> {
    if candidate > ctx.current_version {
        Ok(candidate)
    } else {
        Err(ResolutionError::NotHigher {
            candidate,
            current: ctx.current_version.clone(),
        }
        .into())
    }
}
