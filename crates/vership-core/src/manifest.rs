//! Manifest reading and version rewriting.
//!
//! Supported formats:
//! - Cargo.toml (TOML, rewritten in place to preserve formatting)
//! - package.json (JSON)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use thiserror::Error;

/// Manifest file names tried when none are configured, in order.
pub const MANIFEST_CANDIDATES: [&str; 2] = ["Cargo.toml", "package.json"];

static TOML_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^(\s*version\s*=\s*)"([^"]+)""#).expect("invalid regex")
});

static TOML_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*name\s*=\s*"([^"]+)""#).expect("invalid regex"));

/// Errors raised while reading or rewriting manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File not found.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read or write the file.
    #[error("failed to access manifest: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the file.
    #[error("failed to parse {file}: {reason}")]
    Parse {
        /// Offending file.
        file: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// No version field in the file.
    #[error("version not found in {0}")]
    VersionNotFound(PathBuf),

    /// Unsupported file type.
    #[error("unsupported manifest type: {0}")]
    Unsupported(PathBuf),
}

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Name and version read from a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Package name, if the manifest declares one.
    pub name: Option<String>,
    /// Declared version.
    pub version: Version,
}

/// Reads and rewrites project manifests.
pub trait ManifestStore: Send + Sync {
    /// Reads name and version from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unsupported or malformed.
    fn read(&self, path: &Path) -> ManifestResult<Manifest>;

    /// Replaces the version declared in `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unsupported or malformed.
    fn write_version(&self, path: &Path, version: &Version) -> ManifestResult<()>;
}

/// Returns the manifests present in `root`, in candidate order.
#[must_use]
pub fn detect_manifests(root: &Path) -> Vec<PathBuf> {
    MANIFEST_CANDIDATES
        .iter()
        .filter(|name| root.join(name).is_file())
        .map(PathBuf::from)
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> ManifestResult<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        match filename {
            "Cargo.toml" => Ok(Self::Toml),
            "package.json" => Ok(Self::Json),
            _ => match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => Ok(Self::Toml),
                Some("json") => Ok(Self::Json),
                _ => Err(ManifestError::Unsupported(path.to_path_buf())),
            },
        }
    }
}

/// [`ManifestStore`] working on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileManifests;

impl FileManifests {
    /// Creates a new file-backed store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ManifestStore for FileManifests {
    fn read(&self, path: &Path) -> ManifestResult<Manifest> {
        let format = Format::of(path)?;
        let content = read_existing(path)?;
        match format {
            Format::Toml => read_toml(path, &content),
            Format::Json => read_json(path, &content),
        }
    }

    fn write_version(&self, path: &Path, version: &Version) -> ManifestResult<()> {
        let format = Format::of(path)?;
        let content = read_existing(path)?;
        let updated = match format {
            Format::Toml => rewrite_toml(path, &content, version)?,
            Format::Json => rewrite_json(path, &content, version)?,
        };
        fs::write(path, updated)?;
        Ok(())
    }
}

fn read_existing(path: &Path) -> ManifestResult<String> {
    if !path.exists() {
        return Err(ManifestError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

fn parse_version(path: &Path, raw: &str) -> ManifestResult<Version> {
    Version::parse(raw).map_err(|e| ManifestError::Parse {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn read_toml(path: &Path, content: &str) -> ManifestResult<Manifest> {
    let raw = TOML_VERSION_RE
        .captures(content)
        .and_then(|caps| caps.get(2))
        .ok_or_else(|| ManifestError::VersionNotFound(path.to_path_buf()))?;

    let name = TOML_NAME_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    Ok(Manifest {
        name,
        version: parse_version(path, raw.as_str())?,
    })
}

fn rewrite_toml(path: &Path, content: &str, version: &Version) -> ManifestResult<String> {
    if !TOML_VERSION_RE.is_match(content) {
        return Err(ManifestError::VersionNotFound(path.to_path_buf()));
    }
    Ok(TOML_VERSION_RE
        .replace(content, format!(r#"${{1}}"{version}""#))
        .into_owned())
}

fn parse_json(
    path: &Path,
    content: &str,
) -> ManifestResult<serde_json::Map<String, serde_json::Value>> {
    let json: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ManifestError::Parse {
            file: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    match json {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(ManifestError::Parse {
            file: path.to_path_buf(),
            reason: "not a JSON object".to_string(),
        }),
    }
}

fn read_json(path: &Path, content: &str) -> ManifestResult<Manifest> {
    let map = parse_json(path, content)?;
    let raw = map
        .get("version")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ManifestError::VersionNotFound(path.to_path_buf()))?;

    Ok(Manifest {
        name: map
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        version: parse_version(path, raw)?,
    })
}

fn rewrite_json(path: &Path, content: &str, version: &Version) -> ManifestResult<String> {
    let mut map = parse_json(path, content)?;
    if !map.contains_key("version") {
        return Err(ManifestError::VersionNotFound(path.to_path_buf()));
    }
    map.insert(
        "version".to_string(),
        serde_json::Value::String(version.to_string()),
    );

    // Pretty formatting with trailing newline, as npm writes it.
    let pretty = serde_json::to_string_pretty(&serde_json::Value::Object(map)).map_err(|e| {
        ManifestError::Parse {
            file: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    Ok(format!("{pretty}\n"))
}
