//! History queries through `git2`.

use std::path::Path;

use chrono::{TimeZone, Utc};
use git2::Repository as Git2Repo;
use tracing::debug;
use vership_commit::RawCommit;

use crate::{GitError, GitResult};

/// A read-only view of a repository's tags and commit history.
pub struct Repository {
    inner: Git2Repo,
}

impl Repository {
    /// Opens a repository at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a valid Git repository.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner = Git2Repo::open(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self { inner })
    }

    /// Discovers the repository containing `path`, searching parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is found.
    pub fn discover(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner =
            Git2Repo::discover(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self { inner })
    }

    /// Returns the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.workdir().unwrap_or_else(|| self.inner.path())
    }

    /// Returns all tag names.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    pub fn tags(&self) -> GitResult<Vec<String>> {
        let tags = self.inner.tag_names(None)?;
        Ok(tags.iter().flatten().map(String::from).collect())
    }

    /// Returns the commits reachable from `HEAD` but not from `tag`, newest
    /// first. With no tag, the whole history is returned; an unborn `HEAD`
    /// yields no commits.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag does not exist or history cannot be read.
    pub fn commits_since(&self, tag: Option<&str>) -> GitResult<Vec<RawCommit>> {
        if self.inner.head().is_err() {
            return Ok(Vec::new());
        }

        let mut revwalk = self.inner.revwalk()?;
        revwalk.push_head()?;

        if let Some(tag_name) = tag {
            let target = self
                .inner
                .resolve_reference_from_short_name(tag_name)
                .and_then(|reference| reference.peel_to_commit())
                .map_err(|_| GitError::TagNotFound(tag_name.to_string()))?;
            revwalk.hide(target.id())?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.inner.find_commit(oid)?;
            let author = commit.author();

            commits.push(RawCommit::new(
                oid.to_string(),
                commit.message().unwrap_or(""),
                author.name().unwrap_or("Unknown"),
                author.email().unwrap_or(""),
                Utc.timestamp_opt(commit.time().seconds(), 0)
                    .single()
                    .unwrap_or_else(Utc::now),
            ));
        }

        debug!(count = commits.len(), since = ?tag, "read commit history");
        Ok(commits)
    }

    /// Returns the highest-precedence tag of the form `<prefix><semver><suffix>`.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    pub fn latest_version_tag(&self, prefix: &str, suffix: &str) -> GitResult<Option<String>> {
        let mut version_tags: Vec<_> = self
            .tags()?
            .into_iter()
            .filter_map(|tag| {
                let version = tag.strip_prefix(prefix)?.strip_suffix(suffix)?;
                semver::Version::parse(version).ok().map(|v| (tag, v))
            })
            .collect();

        version_tags.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(version_tags.into_iter().next().map(|(tag, _)| tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository as Git2Repository, Signature};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, Repository) {
        let temp_dir = TempDir::new().unwrap();
        let git2_repo = Git2Repository::init(temp_dir.path()).unwrap();

        let mut config = git2_repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        (temp_dir, Repository { inner: git2_repo })
    }

    fn commit(repo: &Repository, message: &str) -> git2::Oid {
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let tree_id = repo.inner.index().unwrap().write_tree().unwrap();
        let tree = repo.inner.find_tree(tree_id).unwrap();

        let parent = repo.inner.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        repo.inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn annotated_tag(repo: &Repository, name: &str) {
        let head = repo.inner.head().unwrap().peel_to_commit().unwrap();
        let sig = repo.inner.signature().unwrap();
        repo.inner
            .tag(name, head.as_object(), &sig, name, false)
            .unwrap();
    }

    fn lightweight_tag(repo: &Repository, name: &str) {
        let head = repo.inner.head().unwrap().peel_to_commit().unwrap();
        repo.inner
            .tag_lightweight(name, head.as_object(), false)
            .unwrap();
    }

    #[test]
    fn test_open_not_a_repo() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            Repository::open(temp_dir.path()),
            Err(GitError::NotARepo(_))
        ));
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let (temp_dir, _repo) = create_test_repo();
        let nested = temp_dir.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Repository::discover(&nested).unwrap();
        assert_eq!(
            found.path().canonicalize().unwrap(),
            temp_dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_commits_since_unborn_head() {
        let (_temp_dir, repo) = create_test_repo();
        assert!(repo.commits_since(None).unwrap().is_empty());
    }

    #[test]
    fn test_commits_since_annotated_tag() {
        let (_temp_dir, repo) = create_test_repo();
        commit(&repo, "chore: init");
        annotated_tag(&repo, "v1.2.3");
        commit(&repo, "fix: second");
        commit(&repo, "feat: third");

        let commits = repo.commits_since(Some("v1.2.3")).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].subject(), "feat: third");
        assert_eq!(commits[1].subject(), "fix: second");
        assert_eq!(commits[0].author, "Test User");
    }

    #[test]
    fn test_commits_since_lightweight_tag() {
        let (_temp_dir, repo) = create_test_repo();
        commit(&repo, "chore: init");
        lightweight_tag(&repo, "v0.1.0");
        commit(&repo, "feat: next");

        let commits = repo.commits_since(Some("v0.1.0")).unwrap();
        assert_eq!(commits.len(), 1);
    }

    #[test]
    fn test_commits_since_unknown_tag() {
        let (_temp_dir, repo) = create_test_repo();
        commit(&repo, "chore: init");

        assert!(matches!(
            repo.commits_since(Some("v9.9.9")),
            Err(GitError::TagNotFound(_))
        ));
    }

    #[test]
    fn test_latest_version_tag_orders_by_precedence() {
        let (_temp_dir, repo) = create_test_repo();
        commit(&repo, "one");
        annotated_tag(&repo, "v1.9.0");
        commit(&repo, "two");
        annotated_tag(&repo, "v1.10.0");
        commit(&repo, "three");
        annotated_tag(&repo, "v1.10.1-rc.1");
        annotated_tag(&repo, "vnext");

        assert_eq!(
            repo.latest_version_tag("v", "").unwrap().as_deref(),
            Some("v1.10.1-rc.1")
        );
    }

    #[test]
    fn test_latest_version_tag_with_affixes() {
        let (_temp_dir, repo) = create_test_repo();
        commit(&repo, "one");
        annotated_tag(&repo, "widgets@1.0.0");
        annotated_tag(&repo, "v3.0.0");

        assert_eq!(
            repo.latest_version_tag("widgets@", "").unwrap().as_deref(),
            Some("widgets@1.0.0")
        );
        assert!(repo.latest_version_tag("release-", "").unwrap().is_none());
    }
}
