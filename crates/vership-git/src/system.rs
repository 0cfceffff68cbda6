//! [`Vcs`] implementation that shells out to the `git` binary.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use vership_commit::RawCommit;

use crate::{GitError, GitResult, Repository, Vcs};

/// Runs `git` in a fixed working directory.
///
/// History queries go through [`Repository`]; everything else spawns the
/// binary so that user configuration (signing, hooks, credentials) applies.
#[derive(Debug, Clone)]
pub struct SystemGit {
    workdir: PathBuf,
}

impl SystemGit {
    /// Creates a runner for the given working directory.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    async fn output(&self, args: &[OsString]) -> GitResult<Output> {
        debug!(args = ?args, "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(GitError::Spawn)
    }

    /// Runs git and returns trimmed stdout, failing on a non-zero exit.
    async fn run<I, S>(&self, args: I) -> GitResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let output = self.output(&args).await?;

        if !output.status.success() {
            let command = args
                .iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");
            return Err(GitError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Runs git and returns trimmed stdout, or `None` on a non-zero exit or
    /// empty output.
    async fn probe<I, S>(&self, args: I) -> GitResult<Option<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let output = self.output(&args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

        Ok((output.status.success() && !stdout.is_empty()).then_some(stdout))
    }

    fn history(&self) -> GitResult<Repository> {
        Repository::discover(&self.workdir)
    }
}

#[async_trait]
impl Vcs for SystemGit {
    async fn version(&self) -> GitResult<String> {
        self.run(["--version"]).await
    }

    async fn is_inside_work_tree(&self) -> GitResult<bool> {
        let inside = self.probe(["rev-parse", "--is-inside-work-tree"]).await?;
        Ok(inside.as_deref() == Some("true"))
    }

    async fn current_branch(&self) -> GitResult<String> {
        self.run(["branch", "--show-current"]).await
    }

    async fn is_clean(&self) -> GitResult<bool> {
        Ok(self.run(["status", "--porcelain"]).await?.is_empty())
    }

    async fn upstream(&self) -> GitResult<Option<String>> {
        self.probe(["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])
            .await
    }

    async fn signing_key(&self) -> GitResult<Option<String>> {
        self.probe(["config", "--get", "user.signingkey"]).await
    }

    async fn remote_url(&self, remote: &str) -> GitResult<Option<String>> {
        self.probe(["remote", "get-url", remote]).await
    }

    async fn remote_head(&self, remote: &str, branch: &str) -> GitResult<Option<String>> {
        let reference = format!("refs/heads/{branch}");
        let listing = self.run(["ls-remote", remote, reference.as_str()]).await?;
        Ok(listing
            .split_whitespace()
            .next()
            .map(ToString::to_string))
    }

    async fn latest_version_tag(&self, prefix: &str, suffix: &str) -> GitResult<Option<String>> {
        self.history()?.latest_version_tag(prefix, suffix)
    }

    async fn commits_since(&self, tag: Option<&str>) -> GitResult<Vec<RawCommit>> {
        self.history()?.commits_since(tag)
    }

    async fn is_tracked(&self, path: &Path) -> GitResult<bool> {
        let args = [
            OsStr::new("ls-files"),
            OsStr::new("--error-unmatch"),
            OsStr::new("--"),
            path.as_os_str(),
        ];
        Ok(self.probe(args).await?.is_some())
    }

    async fn add(&self, paths: &[PathBuf]) -> GitResult<()> {
        let args = [OsStr::new("add"), OsStr::new("--")]
            .into_iter()
            .chain(paths.iter().map(|p| p.as_os_str()));
        self.run(args).await.map(drop)
    }

    async fn unstage(&self, paths: &[PathBuf]) -> GitResult<()> {
        let args = [OsStr::new("reset"), OsStr::new("-q"), OsStr::new("--")]
            .into_iter()
            .chain(paths.iter().map(|p| p.as_os_str()));
        self.run(args).await.map(drop)
    }

    async fn commit(&self, message: &str) -> GitResult<()> {
        self.run(["commit", "-m", message]).await.map(drop)
    }

    async fn reset_soft(&self, revision: &str) -> GitResult<()> {
        self.run(["reset", "--soft", revision]).await.map(drop)
    }

    async fn restore_from_head(&self, path: &Path) -> GitResult<()> {
        let args = [
            OsStr::new("checkout"),
            OsStr::new("HEAD"),
            OsStr::new("--"),
            path.as_os_str(),
        ];
        self.run(args).await.map(drop)
    }

    async fn tag_exists(&self, name: &str) -> GitResult<bool> {
        let reference = format!("refs/tags/{name}");
        let found = self
            .probe(["rev-parse", "-q", "--verify", reference.as_str()])
            .await?;
        Ok(found.is_some())
    }

    async fn create_tag(&self, name: &str, message: &str, signed: bool) -> GitResult<()> {
        let kind = if signed { "-s" } else { "-a" };
        self.run(["tag", kind, name, "-m", message]).await.map(drop)
    }

    async fn delete_tag(&self, name: &str) -> GitResult<()> {
        self.run(["tag", "-d", name]).await.map(drop)
    }

    async fn push(&self, remote: &str, refspec: &str, force: bool) -> GitResult<()> {
        if force {
            self.run(["push", "--force", remote, refspec]).await.map(drop)
        } else {
            self.run(["push", remote, refspec]).await.map(drop)
        }
    }

    async fn hard_reset(&self) -> GitResult<()> {
        self.run(["reset", "--hard", "HEAD"]).await?;
        self.run(["clean", "-fd"]).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn init_repo(dir: &Path) {
        git(dir, &["init", "-q"]);
        git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        git(dir, &["config", "user.name", "Test User"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
        git(dir, &["config", "tag.gpgsign", "false"]);
    }

    fn repo_with_commit() -> (TempDir, SystemGit) {
        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path());
        fs::write(temp_dir.path().join("README.md"), "hello\n").unwrap();
        git(temp_dir.path(), &["add", "."]);
        git(temp_dir.path(), &["commit", "-q", "-m", "chore: init"]);
        let vcs = SystemGit::new(temp_dir.path());
        (temp_dir, vcs)
    }

    /// Adds a bare repository as `origin` and pushes `main` with tracking.
    fn add_remote(dir: &Path) -> TempDir {
        let remote = TempDir::new().unwrap();
        git(remote.path(), &["init", "-q", "--bare"]);
        let url = remote.path().to_string_lossy().to_string();
        git(dir, &["remote", "add", "origin", &url]);
        git(dir, &["push", "-q", "-u", "origin", "main"]);
        remote
    }

    #[tokio::test]
    async fn test_version() {
        let (_dir, vcs) = repo_with_commit();
        assert!(vcs.version().await.unwrap().starts_with("git version"));
    }

    #[tokio::test]
    async fn test_work_tree_detection() {
        let (_dir, vcs) = repo_with_commit();
        assert!(vcs.is_inside_work_tree().await.unwrap());

        let outside = TempDir::new().unwrap();
        let vcs = SystemGit::new(outside.path());
        assert!(!vcs.is_inside_work_tree().await.unwrap());
    }

    #[tokio::test]
    async fn test_branch_and_cleanliness() {
        let (dir, vcs) = repo_with_commit();
        assert_eq!(vcs.current_branch().await.unwrap(), "main");
        assert!(vcs.is_clean().await.unwrap());

        fs::write(dir.path().join("scratch.txt"), "x").unwrap();
        assert!(!vcs.is_clean().await.unwrap());
    }

    #[tokio::test]
    async fn test_upstream_and_remote_head() {
        let (dir, vcs) = repo_with_commit();
        assert!(vcs.upstream().await.unwrap().is_none());

        let _remote = add_remote(dir.path());
        assert_eq!(vcs.upstream().await.unwrap().as_deref(), Some("origin/main"));

        let head = git(dir.path(), &["rev-parse", "HEAD"]);
        assert_eq!(
            vcs.remote_head("origin", "main").await.unwrap(),
            Some(head)
        );
        assert!(vcs.remote_head("origin", "gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_and_soft_reset() {
        let (dir, vcs) = repo_with_commit();
        let before = git(dir.path(), &["rev-parse", "HEAD"]);

        fs::write(dir.path().join("README.md"), "changed\n").unwrap();
        vcs.add(&[PathBuf::from("README.md")]).await.unwrap();
        vcs.commit("chore(release): v1.0.0").await.unwrap();
        assert_eq!(
            git(dir.path(), &["log", "-1", "--format=%s"]),
            "chore(release): v1.0.0"
        );

        vcs.reset_soft("HEAD~1").await.unwrap();
        assert_eq!(git(dir.path(), &["rev-parse", "HEAD"]), before);
        // Changes stay staged.
        assert_eq!(git(dir.path(), &["diff", "--cached", "--name-only"]), "README.md");
    }

    #[tokio::test]
    async fn test_restore_and_unstage() {
        let (dir, vcs) = repo_with_commit();
        let readme = PathBuf::from("README.md");

        fs::write(dir.path().join("README.md"), "changed\n").unwrap();
        vcs.add(std::slice::from_ref(&readme)).await.unwrap();
        vcs.restore_from_head(&readme).await.unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("README.md")).unwrap(), "hello\n");
        assert!(vcs.is_clean().await.unwrap());

        fs::write(dir.path().join("README.md"), "again\n").unwrap();
        vcs.add(std::slice::from_ref(&readme)).await.unwrap();
        vcs.unstage(std::slice::from_ref(&readme)).await.unwrap();
        assert_eq!(git(dir.path(), &["diff", "--cached", "--name-only"]), "");
    }

    #[tokio::test]
    async fn test_is_tracked() {
        let (dir, vcs) = repo_with_commit();
        assert!(vcs.is_tracked(Path::new("README.md")).await.unwrap());

        fs::write(dir.path().join("CHANGELOG.md"), "# Changelog\n").unwrap();
        assert!(!vcs.is_tracked(Path::new("CHANGELOG.md")).await.unwrap());
    }

    #[tokio::test]
    async fn test_tag_lifecycle() {
        let (dir, vcs) = repo_with_commit();
        assert!(!vcs.tag_exists("v1.0.0").await.unwrap());

        vcs.create_tag("v1.0.0", "Release v1.0.0", false).await.unwrap();
        assert!(vcs.tag_exists("v1.0.0").await.unwrap());
        assert_eq!(git(dir.path(), &["cat-file", "-t", "v1.0.0"]), "tag");

        let duplicate = vcs.create_tag("v1.0.0", "again", false).await;
        assert!(matches!(duplicate, Err(GitError::CommandFailed { .. })));

        vcs.delete_tag("v1.0.0").await.unwrap();
        assert!(!vcs.tag_exists("v1.0.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_push_and_delete_remote_tag() {
        let (dir, vcs) = repo_with_commit();
        let remote = add_remote(dir.path());

        vcs.create_tag("v0.1.0", "Release v0.1.0", false).await.unwrap();
        vcs.push("origin", "refs/tags/v0.1.0", false).await.unwrap();
        assert_eq!(git(remote.path(), &["tag", "--list"]), "v0.1.0");

        vcs.push("origin", ":refs/tags/v0.1.0", false).await.unwrap();
        assert_eq!(git(remote.path(), &["tag", "--list"]), "");
    }

    #[tokio::test]
    async fn test_history_queries() {
        let (dir, vcs) = repo_with_commit();
        git(dir.path(), &["tag", "-a", "v1.0.0", "-m", "v1.0.0"]);
        git(dir.path(), &["commit", "-q", "--allow-empty", "-m", "feat: more"]);

        assert_eq!(
            vcs.latest_version_tag("v", "").await.unwrap().as_deref(),
            Some("v1.0.0")
        );
        let commits = vcs.commits_since(Some("v1.0.0")).await.unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].subject(), "feat: more");
    }

    #[tokio::test]
    async fn test_hard_reset_discards_everything() {
        let (dir, vcs) = repo_with_commit();
        fs::write(dir.path().join("README.md"), "dirty\n").unwrap();
        fs::create_dir(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build").join("out.txt"), "x").unwrap();

        vcs.hard_reset().await.unwrap();

        assert!(vcs.is_clean().await.unwrap());
        assert!(!dir.path().join("build").exists());
    }

    #[tokio::test]
    async fn test_failed_command_captures_stderr() {
        let (_dir, vcs) = repo_with_commit();
        let err = vcs.delete_tag("missing").await.unwrap_err();

        assert!(err.to_string().contains("tag -d missing"));
        assert!(err.command_output().is_some());
    }
}
