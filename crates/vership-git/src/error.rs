//! Git error types.

use thiserror::Error;

/// Git-related errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository.
    #[error("not a git repository: {0}")]
    NotARepo(std::path::PathBuf),

    /// Tag not found.
    #[error("tag not found: {0}")]
    TagNotFound(String),

    /// The `git` binary could not be started.
    #[error("failed to run git")]
    Spawn(#[source] std::io::Error),

    /// A `git` invocation exited unsuccessfully.
    #[error("`git {command}` failed ({status})")]
    CommandFailed {
        /// The arguments passed to git.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// Returns the captured output of a failed command, if any.
    #[must_use]
    pub fn command_output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } if !stderr.trim().is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;
