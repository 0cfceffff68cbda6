//! Hosted release publishing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use vership_config::GithubConfig;

/// Errors raised while publishing a hosted release.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The HTTP client could not be created.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// No API token in the environment.
    #[error("environment variable {0} is not set; a token is required to create releases")]
    MissingToken(String),

    /// The request could not be sent or its response read.
    #[error("request to {url} failed")]
    Request {
        /// Endpoint.
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API refused the release.
    #[error("release rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },
}

/// Result type for publishing.
pub type PublishResult<T> = Result<T, PublishError>;

/// A release to create on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// `owner/repo`.
    pub repository: String,
    /// Tag the release points to.
    pub tag: String,
    /// Release title.
    pub title: String,
    /// Release body (the changelog section).
    pub body: String,
    /// Create as a draft.
    pub draft: bool,
    /// Mark as a pre-release.
    pub prerelease: bool,
    /// Mark as the latest release.
    pub make_latest: bool,
}

/// Hosted release collaborator.
#[async_trait]
pub trait ReleasePublisher: Send + Sync {
    /// Checks that a release could be created, without contacting the
    /// service.
    ///
    /// # Errors
    ///
    /// Returns an error naming what is missing.
    fn check(&self) -> PublishResult<()> {
        Ok(())
    }

    /// Creates the release and returns its URL.
    async fn publish(&self, request: &ReleaseRequest) -> PublishResult<String>;
}

#[derive(Debug, Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
    prerelease: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    make_latest: Option<&'static str>,
}

impl<'a> From<&'a ReleaseRequest> for CreateRelease<'a> {
    fn from(request: &'a ReleaseRequest) -> Self {
        Self {
            tag_name: &request.tag,
            name: &request.title,
            body: &request.body,
            draft: request.draft,
            prerelease: request.prerelease,
            make_latest: request.make_latest.then_some("true"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedRelease {
    html_url: String,
}

/// [`ReleasePublisher`] backed by the GitHub REST API.
pub struct GithubPublisher {
    client: reqwest::Client,
    api_url: String,
    token_env: String,
    token: Option<String>,
}

impl GithubPublisher {
    /// Creates a publisher for `api_url`, authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Client`] if the HTTP client cannot be built.
    pub fn new(
        api_url: impl Into<String>,
        token_env: impl Into<String>,
        token: Option<String>,
    ) -> PublishResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(PublishError::Client)?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token_env: token_env.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Creates a publisher from the `[github]` configuration, reading the
    /// token from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &GithubConfig) -> PublishResult<Self> {
        Self::new(
            &config.api_url,
            &config.token_env,
            std::env::var(&config.token_env).ok(),
        )
    }

    fn token(&self) -> PublishResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| PublishError::MissingToken(self.token_env.clone()))
    }

    fn endpoint(&self, repository: &str) -> String {
        format!("{}/repos/{repository}/releases", self.api_url)
    }
}

#[async_trait]
impl ReleasePublisher for GithubPublisher {
    fn check(&self) -> PublishResult<()> {
        self.token().map(drop)
    }

    async fn publish(&self, request: &ReleaseRequest) -> PublishResult<String> {
        let token = self.token()?;

        let url = self.endpoint(&request.repository);
        debug!(%url, tag = %request.tag, "creating release");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&CreateRelease::from(request))
            .send()
            .await
            .map_err(|e| PublishError::Request {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatedRelease = response
            .json()
            .await
            .map_err(|e| PublishError::Request { url, source: e })?;

        Ok(created.html_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReleaseRequest {
        ReleaseRequest {
            repository: "acme/widgets".to_string(),
            tag: "v1.3.0".to_string(),
            title: "v1.3.0".to_string(),
            body: "## [1.3.0]\n".to_string(),
            draft: false,
            prerelease: false,
            make_latest: true,
        }
    }

    #[test]
    fn test_payload() {
        let request = request();
        let payload = serde_json::to_value(CreateRelease::from(&request)).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "tag_name": "v1.3.0",
                "name": "v1.3.0",
                "body": "## [1.3.0]\n",
                "draft": false,
                "prerelease": false,
                "make_latest": "true",
            })
        );
    }

    #[test]
    fn test_payload_omits_make_latest_by_default() {
        let request = ReleaseRequest {
            make_latest: false,
            draft: true,
            ..request()
        };
        let payload = serde_json::to_value(CreateRelease::from(&request)).unwrap();
        assert!(payload.get("make_latest").is_none());
        assert_eq!(payload["draft"], true);
    }

    #[test]
    fn test_endpoint() {
        let publisher =
            GithubPublisher::new("https://ghe.example.com/api/v3/", "GH_TOKEN", None).unwrap();
        assert_eq!(
            publisher.endpoint("acme/widgets"),
            "https://ghe.example.com/api/v3/repos/acme/widgets/releases"
        );
    }

    #[tokio::test]
    async fn test_missing_token() {
        let publisher =
            GithubPublisher::new("https://api.github.com", "VERSHIP_TEST_TOKEN", None).unwrap();
        assert!(matches!(
            publisher.check(),
            Err(PublishError::MissingToken(ref var)) if var == "VERSHIP_TEST_TOKEN"
        ));
        match publisher.publish(&request()).await {
            Err(PublishError::MissingToken(var)) => assert_eq!(var, "VERSHIP_TEST_TOKEN"),
            other => panic!("expected MissingToken, got {other:?}"),
        }
    }

    #[test]
    fn test_check_with_token() {
        let publisher = GithubPublisher::new(
            "https://api.github.com",
            "VERSHIP_TEST_TOKEN",
            Some("ghp_secret".to_string()),
        )
        .unwrap();
        assert!(publisher.check().is_ok());

        let blank =
            GithubPublisher::new("https://api.github.com", "VERSHIP_TEST_TOKEN", Some(" ".into()))
                .unwrap();
        assert!(blank.check().is_err());
    }

    #[test]
    fn test_rejected_display() {
        let err = PublishError::Rejected {
            status: 422,
            message: "already_exists".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "release rejected with status 422: already_exists"
        );
    }
}
