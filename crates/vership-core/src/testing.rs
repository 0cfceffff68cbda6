//! In-memory collaborators for unit tests.

use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use semver::Version;
use tempfile::TempDir;
use vership_commit::RawCommit;
use vership_config::{CONFIG_FILE_NAME, LoadedConfig, default_config_toml, find_and_load_config_from};
use vership_git::{GitError, GitResult, Vcs};

use crate::changelog::KeepAChangelog;
use crate::context::RunContext;
use crate::manifest::{FileManifests, ManifestStore};
use crate::options::Options;
use crate::pipeline::Services;
use crate::prompt::Prompter;
use crate::publish::{PublishError, PublishResult, ReleasePublisher, ReleaseRequest};
use crate::{CoreError, CoreResult};

static NEXT_HASH: AtomicUsize = AtomicUsize::new(1);

pub(crate) fn raw_commit(message: &str) -> RawCommit {
    let n = NEXT_HASH.fetch_add(1, Ordering::Relaxed);
    RawCommit::new(
        format!("{n:07x}{n:033x}"),
        message,
        "octocat",
        "octocat@example.com",
        Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap(),
    )
}

#[derive(Debug)]
pub(crate) struct FakeState {
    pub available: bool,
    pub inside_work_tree: bool,
    pub branch: String,
    pub clean: bool,
    pub upstream: Option<String>,
    pub signing_key: Option<String>,
    pub remote_url: Option<String>,
    pub remote_head: Option<String>,
    pub latest_tag: Option<String>,
    pub commits: Vec<RawCommit>,
    pub tracked: Vec<PathBuf>,
    pub tags: BTreeSet<String>,
    /// Mutations starting with this prefix fail.
    pub fail_on: Option<String>,
    pub fail_also: Option<String>,
    pub mutations: Vec<String>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            available: true,
            inside_work_tree: true,
            branch: "main".to_string(),
            clean: true,
            upstream: Some("origin/main".to_string()),
            signing_key: None,
            remote_url: Some("git@github.com:acme/widgets.git".to_string()),
            remote_head: Some("abc1234".to_string()),
            latest_tag: Some("v1.2.3".to_string()),
            commits: Vec::new(),
            tracked: Vec::new(),
            tags: BTreeSet::new(),
            fail_on: None,
            fail_also: None,
            mutations: Vec::new(),
        }
    }
}

impl FakeState {
    fn fails(&self, mutation: &str) -> bool {
        [&self.fail_on, &self.fail_also]
            .into_iter()
            .flatten()
            .any(|prefix| mutation.starts_with(prefix.as_str()))
    }

    fn mutate(&mut self, mutation: String) -> GitResult<()> {
        if self.fails(&mutation) {
            return Err(GitError::CommandFailed {
                command: mutation,
                status: "exit status: 1".to_string(),
                stderr: "fatal: simulated failure".to_string(),
            });
        }
        self.mutations.push(mutation);
        Ok(())
    }
}

/// Scriptable [`Vcs`] that records every mutation.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeVcs(Arc<Mutex<FakeState>>);

impl FakeVcs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_commits(self, messages: &[&str]) -> Self {
        self.update(|s| s.commits = messages.iter().copied().map(raw_commit).collect());
        self
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.0.lock().unwrap());
    }

    pub(crate) fn mutations(&self) -> Vec<String> {
        self.0.lock().unwrap().mutations.clone()
    }

    pub(crate) fn tags(&self) -> BTreeSet<String> {
        self.0.lock().unwrap().tags.clone()
    }

    fn read<T>(&self, f: impl FnOnce(&FakeState) -> T) -> T {
        f(&self.0.lock().unwrap())
    }
}

fn joined(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn version(&self) -> GitResult<String> {
        if self.read(|s| s.available) {
            Ok("git version 2.45.0".to_string())
        } else {
            Err(GitError::Spawn(io::Error::new(
                io::ErrorKind::NotFound,
                "git not found",
            )))
        }
    }

    async fn is_inside_work_tree(&self) -> GitResult<bool> {
        Ok(self.read(|s| s.inside_work_tree))
    }

    async fn current_branch(&self) -> GitResult<String> {
        Ok(self.read(|s| s.branch.clone()))
    }

    async fn is_clean(&self) -> GitResult<bool> {
        Ok(self.read(|s| s.clean))
    }

    async fn upstream(&self) -> GitResult<Option<String>> {
        Ok(self.read(|s| s.upstream.clone()))
    }

    async fn signing_key(&self) -> GitResult<Option<String>> {
        Ok(self.read(|s| s.signing_key.clone()))
    }

    async fn remote_url(&self, _remote: &str) -> GitResult<Option<String>> {
        Ok(self.read(|s| s.remote_url.clone()))
    }

    async fn remote_head(&self, _remote: &str, _branch: &str) -> GitResult<Option<String>> {
        Ok(self.read(|s| s.remote_head.clone()))
    }

    async fn latest_version_tag(&self, _prefix: &str, _suffix: &str) -> GitResult<Option<String>> {
        Ok(self.read(|s| s.latest_tag.clone()))
    }

    async fn commits_since(&self, _tag: Option<&str>) -> GitResult<Vec<RawCommit>> {
        Ok(self.read(|s| s.commits.clone()))
    }

    async fn is_tracked(&self, path: &Path) -> GitResult<bool> {
        Ok(self.read(|s| s.tracked.iter().any(|p| p == path)))
    }

    async fn add(&self, paths: &[PathBuf]) -> GitResult<()> {
        self.0.lock().unwrap().mutate(format!("add {}", joined(paths)))
    }

    async fn unstage(&self, paths: &[PathBuf]) -> GitResult<()> {
        self.0
            .lock()
            .unwrap()
            .mutate(format!("unstage {}", joined(paths)))
    }

    async fn commit(&self, message: &str) -> GitResult<()> {
        self.0.lock().unwrap().mutate(format!("commit {message}"))
    }

    async fn reset_soft(&self, revision: &str) -> GitResult<()> {
        self.0
            .lock()
            .unwrap()
            .mutate(format!("reset --soft {revision}"))
    }

    async fn restore_from_head(&self, path: &Path) -> GitResult<()> {
        self.0
            .lock()
            .unwrap()
            .mutate(format!("restore {}", path.display()))
    }

    async fn tag_exists(&self, name: &str) -> GitResult<bool> {
        Ok(self.read(|s| s.tags.contains(name)))
    }

    async fn create_tag(&self, name: &str, message: &str, signed: bool) -> GitResult<()> {
        let sign = if signed { "--sign " } else { "" };
        let mut state = self.0.lock().unwrap();
        state.mutate(format!("tag {sign}{name} {message}"))?;
        state.tags.insert(name.to_string());
        Ok(())
    }

    async fn delete_tag(&self, name: &str) -> GitResult<()> {
        let mut state = self.0.lock().unwrap();
        if !state.tags.contains(name) {
            return Err(GitError::TagNotFound(name.to_string()));
        }
        state.mutate(format!("tag -d {name}"))?;
        state.tags.remove(name);
        Ok(())
    }

    async fn push(&self, remote: &str, refspec: &str, force: bool) -> GitResult<()> {
        let force = if force { "--force " } else { "" };
        self.0
            .lock()
            .unwrap()
            .mutate(format!("push {force}{remote} {refspec}"))
    }

    async fn hard_reset(&self) -> GitResult<()> {
        self.0.lock().unwrap().mutate("reset --hard".to_string())
    }
}

/// [`Prompter`] answering from a script.
#[derive(Debug, Default)]
pub(crate) struct ScriptedPrompter {
    selections: Mutex<VecDeque<usize>>,
    inputs: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<Vec<String>>>,
}

impl ScriptedPrompter {
    pub(crate) fn new(selections: &[usize], inputs: &[&str]) -> Self {
        Self {
            selections: Mutex::new(selections.iter().copied().collect()),
            inputs: Mutex::new(inputs.iter().map(|s| (*s).to_string()).collect()),
            seen: Mutex::default(),
        }
    }

    /// Choice lists offered so far.
    pub(crate) fn seen_choices(&self) -> Vec<Vec<String>> {
        self.seen.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&self, message: &str, choices: &[String]) -> CoreResult<usize> {
        self.seen.lock().unwrap().push(choices.to_vec());
        self.selections
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CoreError::Prompt(format!("unexpected prompt: {message}")))
    }

    fn input(&self, message: &str) -> CoreResult<String> {
        self.inputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CoreError::Prompt(format!("unexpected prompt: {message}")))
    }
}

/// [`ReleasePublisher`] that records requests.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakePublisher {
    requests: Arc<Mutex<Vec<ReleaseRequest>>>,
    fail: Arc<Mutex<bool>>,
    no_token: Arc<Mutex<bool>>,
}

impl FakePublisher {
    pub(crate) fn requests(&self) -> Vec<ReleaseRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Makes every later publish fail.
    pub(crate) fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }

    /// Behaves as if no API token were configured.
    pub(crate) fn remove_token(&self) {
        *self.no_token.lock().unwrap() = true;
    }
}

#[async_trait]
impl ReleasePublisher for FakePublisher {
    fn check(&self) -> PublishResult<()> {
        if *self.no_token.lock().unwrap() {
            return Err(PublishError::MissingToken("GITHUB_TOKEN".to_string()));
        }
        Ok(())
    }

    async fn publish(&self, request: &ReleaseRequest) -> PublishResult<String> {
        self.check()?;
        if *self.fail.lock().unwrap() {
            return Err(PublishError::Rejected {
                status: 422,
                message: "Validation Failed".to_string(),
            });
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(format!(
            "https://github.com/{}/releases/tag/{}",
            request.repository, request.tag
        ))
    }
}

/// A project directory at 1.2.3 with a feature and a fix since `v1.2.3`.
pub(crate) struct Harness {
    dir: TempDir,
    pub vcs: FakeVcs,
    pub publisher: FakePublisher,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"widgets\"\nversion = \"1.2.3\"\n",
        )
        .unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), default_config_toml()).unwrap();

        Self {
            dir,
            vcs: FakeVcs::new().with_commits(&["feat: add export", "fix: handle empty input"]),
            publisher: FakePublisher::default(),
        }
    }

    pub(crate) fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub(crate) fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub(crate) fn services(&self) -> Services {
        Services {
            workdir: self.dir.path().to_path_buf(),
            vcs: Box::new(self.vcs.clone()),
            manifests: Box::new(FileManifests::new()),
            changelog: Box::new(KeepAChangelog::new()),
            publisher: Box::new(self.publisher.clone()),
            prompter: Box::new(ScriptedPrompter::default()),
        }
    }

    pub(crate) fn loaded_config(&self) -> LoadedConfig {
        find_and_load_config_from(self.dir.path()).unwrap()
    }

    /// Context as enrichment would build it.
    pub(crate) fn context(&self, options: Options) -> RunContext {
        let loaded = self.loaded_config();
        let manifest = FileManifests::new()
            .read(&self.path("Cargo.toml"))
            .unwrap();
        RunContext::new(options, loaded.config)
            .with_config_path(loaded.path)
            .with_manifest(manifest, vec![PathBuf::from("Cargo.toml")])
            .with_repository(Some("acme/widgets".to_string()))
            .with_previous_tag(Some("v1.2.3".to_string()))
    }

    /// Context after the version stage picked 1.3.0.
    pub(crate) fn resolved(&self, options: Options) -> RunContext {
        self.context(options)
            .with_next_version(Version::new(1, 3, 0))
            .unwrap()
    }
}
