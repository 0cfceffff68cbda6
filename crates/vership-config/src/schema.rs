//! Configuration schema.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult, TemplateVars, render};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Manifest configuration.
    #[serde(default)]
    pub version: VersionConfig,

    /// Changelog configuration.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    /// Git requirements and templates.
    #[serde(default)]
    pub git: GitConfig,

    /// GitHub release configuration.
    #[serde(default)]
    pub github: GithubConfig,
}

impl Config {
    /// Checks values that deserialization alone cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first offending value.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.git.tag_name.contains("{{version}}") {
            return Err(ConfigError::Invalid(format!(
                "git.tag_name must contain {{{{version}}}}, got {:?}",
                self.git.tag_name
            )));
        }
        if self.git.require_branch && self.git.branches.is_empty() {
            return Err(ConfigError::Invalid(
                "git.require_branch is set but git.branches is empty".to_string(),
            ));
        }
        if self.changelog.path.trim().is_empty() {
            return Err(ConfigError::Invalid("changelog.path is empty".to_string()));
        }
        Ok(())
    }
}

/// Manifest configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConfig {
    /// Manifest files whose version field is rewritten. The first one is the
    /// source of the current version. Empty means auto-detect.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Changelog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// Whether the changelog stage runs.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Changelog file path, relative to the project root.
    #[serde(default = "default_changelog_path")]
    pub path: String,

    /// Append the short commit hash to each entry.
    #[serde(default)]
    pub include_hashes: bool,

    /// Append the commit author to each entry.
    #[serde(default)]
    pub include_authors: bool,

    /// Section heading overrides keyed by commit type.
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_changelog_path(),
            include_hashes: false,
            include_authors: false,
            labels: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_changelog_path() -> String {
    "CHANGELOG.md".to_string()
}

/// Git requirements and templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    /// `owner/repo`, or `auto` to derive it from the remote URL.
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Remote used for pushing and repository detection.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Require the current branch to be listed in `branches`.
    #[serde(default)]
    pub require_branch: bool,

    /// Branches releases may be cut from.
    #[serde(default = "default_branches")]
    pub branches: Vec<String>,

    /// Require a clean working tree.
    #[serde(default = "default_true")]
    pub require_clean_working_dir: bool,

    /// Require the current branch to track an upstream.
    #[serde(default = "default_true")]
    pub require_upstream: bool,

    /// Release commit message template.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Tag name template.
    #[serde(default = "default_tag_name")]
    pub tag_name: String,

    /// Tag annotation template.
    #[serde(default = "default_tag_annotation")]
    pub tag_annotation: String,
}

impl GitConfig {
    /// Returns the text around `{{version}}` in the tag template, with
    /// `{{name}}` already substituted.
    #[must_use]
    pub fn tag_affixes(&self, name: &str) -> (String, String) {
        let rendered = render(
            &self.tag_name,
            TemplateVars {
                version: "{{version}}",
                name,
            },
        );
        match rendered.split_once("{{version}}") {
            Some((prefix, suffix)) => (prefix.to_string(), suffix.to_string()),
            None => (rendered, String::new()),
        }
    }

    /// Returns true if `repository` asks for detection from the remote.
    #[must_use]
    pub fn detects_repository(&self) -> bool {
        self.repository.eq_ignore_ascii_case("auto")
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            remote: default_remote(),
            require_branch: false,
            branches: default_branches(),
            require_clean_working_dir: true,
            require_upstream: true,
            commit_message: default_commit_message(),
            tag_name: default_tag_name(),
            tag_annotation: default_tag_annotation(),
        }
    }
}

fn default_repository() -> String {
    "auto".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branches() -> Vec<String> {
    vec!["main".to_string(), "master".to_string()]
}

fn default_commit_message() -> String {
    "chore(release): v{{version}}".to_string()
}

fn default_tag_name() -> String {
    "v{{version}}".to_string()
}

fn default_tag_annotation() -> String {
    "Release v{{version}}".to_string()
}

/// GitHub configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Release creation settings.
    #[serde(default)]
    pub release: GithubReleaseConfig,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_env: default_token_env(),
            release: GithubReleaseConfig::default(),
        }
    }
}

impl GithubConfig {
    /// Returns the web address matching `api_url`.
    ///
    /// `https://api.github.com` maps to `https://github.com`; an Enterprise
    /// endpoint loses its `/api/v3` suffix.
    #[must_use]
    pub fn web_url(&self) -> String {
        let api_url = self.api_url.trim_end_matches('/');
        if api_url == default_api_url() {
            "https://github.com".to_string()
        } else {
            api_url.trim_end_matches("/api/v3").to_string()
        }
    }

    /// Returns the host name of [`web_url`](Self::web_url).
    #[must_use]
    pub fn web_host(&self) -> String {
        let web = self.web_url();
        let without_scheme = web.split_once("://").map_or(web.as_str(), |(_, rest)| rest);
        without_scheme
            .split(['/', ':'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

/// GitHub release settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubReleaseConfig {
    /// Whether the release stage runs.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Release title template.
    #[serde(default = "default_release_title")]
    pub title: String,
}

impl Default for GithubReleaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: default_release_title(),
        }
    }
}

fn default_release_title() -> String {
    "v{{version}}".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.version.files.is_empty());
        assert!(config.changelog.enabled);
        assert_eq!(config.changelog.path, "CHANGELOG.md");
        assert_eq!(config.git.repository, "auto");
        assert_eq!(config.git.remote, "origin");
        assert!(!config.git.require_branch);
        assert!(config.git.require_clean_working_dir);
        assert!(config.git.require_upstream);
        assert_eq!(config.git.tag_name, "v{{version}}");
        assert!(config.github.release.enabled);
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
    }

    #[test]
    fn test_deserialize_empty_matches_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [git]
            require_upstream = false
            branches = ["release"]

            [github.release]
            enabled = false
        "#,
        )
        .unwrap();

        assert!(!config.git.require_upstream);
        assert!(config.git.require_clean_working_dir);
        assert_eq!(config.git.branches, vec!["release".to_string()]);
        assert_eq!(config.git.commit_message, "chore(release): v{{version}}");
        assert!(!config.github.release.enabled);
        assert_eq!(config.github.release.title, "v{{version}}");
    }

    #[test]
    fn test_deserialize_full() {
        let config: Config = toml::from_str(
            r#"
            [version]
            files = ["package.json", "crates/cli/Cargo.toml"]

            [changelog]
            enabled = true
            path = "HISTORY.md"
            include_hashes = true

            [changelog.labels]
            feat = "Features"

            [git]
            repository = "acme/widgets"
            remote = "upstream"
            require_branch = true
            branches = ["main"]
            require_clean_working_dir = false
            require_upstream = false
            commit_message = "release: {{name}} {{version}}"
            tag_name = "{{name}}@{{version}}"
            tag_annotation = "{{name}} {{version}}"

            [github]
            api_url = "https://ghe.example.com/api/v3"
            token_env = "GH_TOKEN"

            [github.release]
            title = "{{name}} {{version}}"
        "#,
        )
        .unwrap();

        assert_eq!(config.version.files.len(), 2);
        assert_eq!(config.changelog.path, "HISTORY.md");
        assert!(config.changelog.include_hashes);
        assert_eq!(config.changelog.labels["feat"], "Features");
        assert_eq!(config.git.repository, "acme/widgets");
        assert!(!config.git.detects_repository());
        assert_eq!(config.git.remote, "upstream");
        assert_eq!(config.github.token_env, "GH_TOKEN");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_wrong_type() {
        let result: Result<Config, _> = toml::from_str("[git]\nbranches = \"main\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_tag_affixes() {
        let mut git = GitConfig::default();
        assert_eq!(git.tag_affixes("widgets"), ("v".to_string(), String::new()));

        git.tag_name = "{{name}}@{{version}}-final".to_string();
        assert_eq!(
            git.tag_affixes("widgets"),
            ("widgets@".to_string(), "-final".to_string())
        );
    }

    #[test]
    fn test_web_url_and_host() {
        let mut github = GithubConfig::default();
        assert_eq!(github.web_url(), "https://github.com");
        assert_eq!(github.web_host(), "github.com");

        github.api_url = "https://api.github.com/".to_string();
        assert_eq!(github.web_url(), "https://github.com");

        github.api_url = "https://GHE.example.com:8443/api/v3".to_string();
        assert_eq!(github.web_url(), "https://GHE.example.com:8443");
        assert_eq!(github.web_host(), "ghe.example.com");
    }

    #[test]
    fn test_validate_rejects_tag_without_version() {
        let mut config = Config::default();
        config.git.tag_name = "latest".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_branch_list() {
        let mut config = Config::default();
        config.git.require_branch = true;
        config.git.branches.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialize_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("[git]"));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
