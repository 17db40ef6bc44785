//! GitHub REST API client
//!
//! Implements the two existence checks against the GitHub v3 API:
//!
//! - `GET /repos/{owner}/{repo}/branches/{branch}`
//! - `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}`
//!
//! A 2xx answer means the resource exists and a 404 means it does not. Any
//! other status, a timeout, or a transport failure is a [`ProviderError`]; the
//! client never retries.
//!
//! # Example
//!
//! ```no_run
//! use build_tool_detector::provider::{GitHubClient, ProviderClient};
//! use build_tool_detector::reference::ReferenceResolver;
//! use build_tool_detector::token::Credential;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitHubClient::new("https://api.github.com", Duration::from_secs(10))?;
//! let reference = ReferenceResolver::new("github.com", "master")
//!     .resolve("https://github.com/acme/widgets", None)?;
//!
//! let status = client
//!     .content_exists(&reference, "pom.xml", &Credential::anonymous())
//!     .await?;
//! println!("pom.xml: {:?}", status);
//! # Ok(())
//! # }
//! ```

use super::{ProbeStatus, ProviderClient, ProviderError};
use crate::reference::RepositoryReference;
use crate::token::Credential;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// GitHub API client
///
/// Holds one connection pool for the whole process; clone-free sharing goes
/// through `Arc`.
pub struct GitHubClient {
    /// API base URL (e.g. "https://api.github.com")
    api_url: Url,

    /// Shared HTTP client with connection pooling
    http_client: Client,

    /// Per-request timeout
    timeout: Duration,
}

impl GitHubClient {
    /// Creates a client for `api_url` with the given per-request timeout
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let api_url = Url::parse(api_url).map_err(|e| ProviderError::InvalidRequest {
            message: format!("invalid api url '{}': {}", api_url, e),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidRequest {
                message: format!("api url '{}' cannot be a base", api_url),
            });
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            api_url,
            http_client,
            timeout,
        })
    }

    fn repo_url(&self, reference: &RepositoryReference, tail: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidRequest {
                message: "api url cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["repos", reference.owner(), reference.repository()])
            .extend(tail);
        Ok(url)
    }

    async fn exists(&self, url: Url, credential: &Credential) -> Result<ProbeStatus, ProviderError> {
        let mut request = self
            .http_client
            .get(url.clone())
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, concat!("build-tool-detector/", env!("CARGO_PKG_VERSION")));
        if !credential.is_anonymous() {
            request = request.bearer_auth(credential.expose());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!(%url, "GitHub request timed out after {:?}", self.timeout);
                ProviderError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
            } else {
                warn!(%url, error = %e, "GitHub request failed");
                ProviderError::Transport {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "GitHub responded");

        if status.is_success() {
            Ok(ProbeStatus::Found)
        } else if status == StatusCode::NOT_FOUND {
            Ok(ProbeStatus::NotFound)
        } else {
            warn!(%url, status = status.as_u16(), "GitHub returned unexpected status");
            Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl ProviderClient for GitHubClient {
    async fn branch_exists(
        &self,
        reference: &RepositoryReference,
        credential: &Credential,
    ) -> Result<ProbeStatus, ProviderError> {
        let url = self.repo_url(reference, &["branches", reference.branch()])?;
        self.exists(url, credential).await
    }

    async fn content_exists(
        &self,
        reference: &RepositoryReference,
        path: &str,
        credential: &Credential,
    ) -> Result<ProbeStatus, ProviderError> {
        let mut tail = vec!["contents"];
        tail.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.repo_url(reference, &tail)?;
        url.query_pairs_mut().append_pair("ref", reference.branch());
        self.exists(url, credential).await
    }

    fn name(&self) -> &str {
        "github"
    }
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}
