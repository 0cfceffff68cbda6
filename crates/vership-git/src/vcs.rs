//! Version-control operations used by the release pipeline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use vership_commit::RawCommit;

use crate::GitResult;

/// Version-control collaborator.
///
/// Every method is a single awaited external call; implementations must not
/// leave background work running when a method returns.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Returns the version banner of the underlying tool (`git --version`).
    async fn version(&self) -> GitResult<String>;

    /// Returns true if the working directory is inside a work tree.
    async fn is_inside_work_tree(&self) -> GitResult<bool>;

    /// Returns the name of the checked-out branch.
    async fn current_branch(&self) -> GitResult<String>;

    /// Returns true if there are no staged, unstaged or untracked changes.
    async fn is_clean(&self) -> GitResult<bool>;

    /// Returns the upstream of the current branch (`origin/main`), if any.
    async fn upstream(&self) -> GitResult<Option<String>>;

    /// Returns the configured tag signing key, if any.
    async fn signing_key(&self) -> GitResult<Option<String>>;

    /// Returns the URL of `remote`, if it exists.
    async fn remote_url(&self, remote: &str) -> GitResult<Option<String>>;

    /// Returns the commit `branch` points to on `remote`, if the branch exists there.
    async fn remote_head(&self, remote: &str, branch: &str) -> GitResult<Option<String>>;

    /// Returns the highest version tag of the form `<prefix><semver><suffix>`.
    async fn latest_version_tag(&self, prefix: &str, suffix: &str) -> GitResult<Option<String>>;

    /// Returns commits since `tag` (or the whole history), newest first.
    async fn commits_since(&self, tag: Option<&str>) -> GitResult<Vec<RawCommit>>;

    /// Returns true if `path` is tracked in `HEAD`.
    async fn is_tracked(&self, path: &Path) -> GitResult<bool>;

    /// Stages the given paths.
    async fn add(&self, paths: &[PathBuf]) -> GitResult<()>;

    /// Removes the given paths from the index, keeping working tree content.
    async fn unstage(&self, paths: &[PathBuf]) -> GitResult<()>;

    /// Records a commit of the staged changes.
    async fn commit(&self, message: &str) -> GitResult<()>;

    /// Moves `HEAD` to `revision`, keeping index and working tree.
    async fn reset_soft(&self, revision: &str) -> GitResult<()>;

    /// Restores `path` in index and working tree from `HEAD`.
    async fn restore_from_head(&self, path: &Path) -> GitResult<()>;

    /// Returns true if a local tag named `name` exists.
    async fn tag_exists(&self, name: &str) -> GitResult<bool>;

    /// Creates an annotated tag on `HEAD`, signed when `signed` is set.
    async fn create_tag(&self, name: &str, message: &str, signed: bool) -> GitResult<()>;

    /// Deletes a local tag.
    async fn delete_tag(&self, name: &str) -> GitResult<()>;

    /// Pushes `refspec` to `remote`.
    async fn push(&self, remote: &str, refspec: &str, force: bool) -> GitResult<()>;

    /// Discards all local changes: `reset --hard HEAD` followed by `clean -fd`.
    async fn hard_reset(&self) -> GitResult<()>;
}
