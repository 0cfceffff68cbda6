//! Configuration loader.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Config, ConfigError, ConfigResult};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "vership.toml";

/// A configuration together with the file it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// The file that was read, `None` when defaults are in effect.
    pub path: Option<PathBuf>,

    /// The merged configuration.
    pub config: Config,
}

/// Loads and validates configuration from the given path.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    debug!(?path, "loading configuration");

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;

    Ok(config)
}

/// Walks up from `start_dir` and returns the first configuration file found.
#[must_use]
pub fn locate_config(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    start_dir
        .as_ref()
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Finds and loads configuration starting from the given directory.
///
/// Falls back to the defaults when no file exists in the directory or any
/// of its parents.
///
/// # Errors
///
/// Returns an error if a file is found but cannot be read, parsed or validated.
pub fn find_and_load_config_from(start_dir: impl AsRef<Path>) -> ConfigResult<LoadedConfig> {
    match locate_config(start_dir) {
        Some(path) => {
            let config = load_config(&path)?;
            Ok(LoadedConfig {
                path: Some(path),
                config,
            })
        }
        None => {
            debug!("no configuration file found, using defaults");
            Ok(LoadedConfig::default())
        }
    }
}

/// Returns the annotated configuration written by `vership init`.
#[must_use]
pub fn default_config_toml() -> &'static str {
    r#"# vership configuration

[version]
# Manifests to rewrite; the first one provides the current version.
# Leave empty to use Cargo.toml or package.json from the project root.
files = []

[changelog]
enabled = true
path = "CHANGELOG.md"
include_hashes = false
include_authors = false

[git]
# "auto" reads owner/repo from the remote URL.
repository = "auto"
remote = "origin"
require_branch = false
branches = ["main", "master"]
require_clean_working_dir = true
require_upstream = true
commit_message = "chore(release): v{{version}}"
tag_name = "v{{version}}"
tag_annotation = "Release v{{version}}"

[github]
api_url = "https://api.github.com"
token_env = "GITHUB_TOKEN"

[github.release]
enabled = true
title = "v{{version}}"
"#
}
