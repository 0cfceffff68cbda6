//! Remote URL helpers.

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?|ssh|git)://(?:[^@/\s]+@)?(?P<host>[^:/\s]+)(?::\d+)?/(?P<path>\S+)$")
        .expect("invalid regex")
});

static SCP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@/\s]+@)?(?P<host>[^:/\s]+):(?P<path>[^/\s]\S*)$").expect("invalid regex")
});

/// Extracts the `owner/repo` identifier from a remote URL on `host`.
///
/// Handles scp-like (`git@github.com:owner/repo.git`), HTTPS and `ssh://`
/// forms. Local paths, other hosts and nested groups yield `None`.
#[must_use]
pub fn repository_slug(url: &str, host: &str) -> Option<String> {
    let url = url.trim();
    let captures = URL_RE.captures(url).or_else(|| SCP_RE.captures(url))?;
    if !captures["host"].eq_ignore_ascii_case(host) {
        return None;
    }

    let path = captures["path"].trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    match path.split('/').collect::<Vec<_>>().as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => Some(format!("{owner}/{repo}")),
        _ => None,
    }
}
