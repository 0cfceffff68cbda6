//! Changelog generation in the [Keep a Changelog](https://keepachangelog.com/) format.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

use chrono::NaiveDate;
use semver::Version;
use vership_commit::ParsedCommit;
use vership_config::ChangelogConfig;

/// Header written to a changelog file that does not exist yet.
pub const CHANGELOG_HEADER: &str = "# Changelog\n\n\
All notable changes to this project will be documented in this file.\n\n\
The format is based on [Keep a Changelog](https://keepachangelog.com/en/1.1.0/),\n\
and this project adheres to [Semantic Versioning](https://semver.org/spec/v2.0.0.html).\n\n";

/// Everything a generator needs to describe one release.
#[derive(Debug, Clone)]
pub struct ReleaseNotes {
    /// The version being released.
    pub version: Version,
    /// Release date.
    pub date: NaiveDate,
    /// Commits since the previous release, newest first.
    pub commits: Vec<ParsedCommit>,
    /// Link comparing the previous tag with the new one.
    pub compare_url: Option<String>,
}

/// Renders the changelog section of a release.
pub trait ChangelogGenerator: Send + Sync {
    /// Returns the Markdown section for `notes`.
    fn generate(&self, notes: &ReleaseNotes) -> String;
}

/// Keep a Changelog generator.
#[derive(Debug, Clone, Default)]
pub struct KeepAChangelog {
    include_hashes: bool,
    include_authors: bool,
    labels: HashMap<String, String>,
}

impl KeepAChangelog {
    /// Creates a generator with default labels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator from the `[changelog]` configuration.
    #[must_use]
    pub fn from_config(config: &ChangelogConfig) -> Self {
        Self {
            include_hashes: config.include_hashes,
            include_authors: config.include_authors,
            labels: config.labels.clone(),
        }
    }

    fn label(&self, commit_type: &str) -> String {
        self.labels
            .get(commit_type)
            .cloned()
            .unwrap_or_else(|| default_label(commit_type).to_string())
    }

    fn entry(&self, commit: &ParsedCommit) -> String {
        let scope = commit
            .scope
            .as_ref()
            .map(|s| format!("**{s}:** "))
            .unwrap_or_default();

        let hash = if self.include_hashes {
            format!(" ({})", commit.short_hash())
        } else {
            String::new()
        };

        let author = if self.include_authors && !commit.author.is_empty() {
            format!(" - @{}", commit.author)
        } else {
            String::new()
        };

        format!("- {scope}{}{hash}{author}", commit.subject)
    }
}

fn default_label(commit_type: &str) -> &str {
    match commit_type {
        "feat" => "Added",
        "fix" => "Fixed",
        "docs" => "Documentation",
        "style" => "Styling",
        "refactor" => "Changed",
        "perf" => "Performance",
        "test" => "Testing",
        "build" | "ci" => "Build",
        "chore" => "Maintenance",
        "revert" => "Reverted",
        "deps" => "Dependencies",
        "security" => "Security",
        "breaking" => "Breaking Changes",
        other => other,
    }
}

const SECTION_ORDER: [&str; 13] = [
    "security", "feat", "fix", "perf", "refactor", "docs", "style", "test", "build", "ci", "deps",
    "chore", "revert",
];

impl ChangelogGenerator for KeepAChangelog {
    fn generate(&self, notes: &ReleaseNotes) -> String {
        let mut output = String::new();
        _ = writeln!(
            output,
            "## [{}] - {}\n",
            notes.version,
            notes.date.format("%Y-%m-%d")
        );

        let breaking: Vec<&str> = notes
            .commits
            .iter()
            .flat_map(ParsedCommit::breaking_notes)
            .map(|note| note.text.as_str())
            .collect();
        let mut wrote_section = !breaking.is_empty();
        if wrote_section {
            _ = writeln!(output, "### {}\n", self.label("breaking"));
            for text in breaking {
                _ = writeln!(output, "- {text}");
            }
            output.push('\n');
        }

        // BTreeMap keeps unknown types in a stable order.
        let mut groups: BTreeMap<&str, Vec<&ParsedCommit>> = BTreeMap::new();
        for commit in &notes.commits {
            if let Some(commit_type) = commit.r#type.as_deref() {
                groups.entry(commit_type).or_default().push(commit);
            }
        }

        let unknown = groups
            .keys()
            .copied()
            .filter(|t| !SECTION_ORDER.contains(t))
            .collect::<Vec<_>>();
        for commit_type in SECTION_ORDER.into_iter().chain(unknown) {
            let Some(commits) = groups.get(commit_type) else {
                continue;
            };
            _ = writeln!(output, "### {}\n", self.label(commit_type));
            for commit in commits {
                _ = writeln!(output, "{}", self.entry(commit));
            }
            output.push('\n');
            wrote_section = true;
        }

        if !wrote_section {
            output.push_str("No notable changes.\n\n");
        }

        if let Some(url) = &notes.compare_url {
            _ = writeln!(output, "[{}]: {url}\n", notes.version);
        }

        output
    }
}

/// Inserts `section` above the newest release in `existing`.
///
/// An empty file receives the standard header first. Without any release
/// heading the section is appended.
#[must_use]
pub fn prepend_section(existing: &str, section: &str) -> String {
    if existing.trim().is_empty() {
        return format!("{CHANGELOG_HEADER}{section}");
    }

    if existing.starts_with("## ") {
        return format!("{section}{existing}");
    }

    if let Some(pos) = existing.find("\n## ") {
        let (before, after) = existing.split_at(pos + 1);
        return format!("{before}{section}{after}");
    }

    let separator = if existing.ends_with("\n\n") {
        ""
    } else if existing.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };
    format!("{existing}{separator}{section}")
}
