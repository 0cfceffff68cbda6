//! Git abstraction layer for vership.
//!
//! This crate provides:
//! - [`Vcs`]: the version-control operations the release pipeline needs
//! - [`SystemGit`]: a [`Vcs`] backed by the `git` binary
//! - [`Repository`]: history queries through `git2`
//! - [`repository_slug`]: `owner/repo` extraction from remote URLs

mod error;
mod remote;
mod repository;
mod system;
mod vcs;

pub use error::{GitError, GitResult};
pub use remote::repository_slug;
pub use repository::Repository;
pub use system::SystemGit;
pub use vcs::Vcs;
