//! Configuration management for vership.
//!
//! This crate handles loading the `vership.toml` configuration file and
//! rendering the `{{version}}`/`{{name}}` templates it contains.

mod error;
mod loader;
mod schema;
mod template;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    CONFIG_FILE_NAME, LoadedConfig, default_config_toml, find_and_load_config_from, load_config,
    locate_config,
};
pub use schema::{
    ChangelogConfig, Config, GitConfig, GithubConfig, GithubReleaseConfig, VersionConfig,
};
pub use template::{TemplateVars, render};
