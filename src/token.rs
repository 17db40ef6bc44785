//! Provider credentials
//!
//! Detection never reaches for a global token. Callers hand a
//! [`TokenProvider`] to the detection entry point, which asks it for a
//! credential scoped to the provider host.
//!
//! Two implementations ship with the crate:
//! - [`StaticTokenProvider`] returns a token from configuration (or none, which
//!   results in unauthenticated provider calls with reduced rate limits)
//! - [`AuthServiceTokenProvider`] exchanges the caller's bearer token for a
//!   provider token at an external auth service

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Once;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

const TOKEN_PATH: &str = "/api/token";

/// Access credential for the provider API
///
/// Cheap to clone and shared by value across the probes of one request. The
/// token never appears in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Credential that makes unauthenticated requests
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            f.write_str("Credential(anonymous)")
        } else {
            f.write_str("Credential(***)")
        }
    }
}

/// Errors raised while acquiring a credential
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("auth service request failed: {0}")]
    Request(String),

    #[error("auth service returned HTTP {status}")]
    Status { status: u16 },

    #[error("auth service response could not be parsed: {0}")]
    InvalidResponse(String),

    #[error("no token available for {0}")]
    Missing(String),

    #[error("invalid auth service url: {0}")]
    InvalidUrl(String),
}

/// Capability that produces a provider credential
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire_token(&self, for_host: &str) -> Result<Credential, TokenError>;
}

/// Token taken from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

static ANONYMOUS_WARNING: Once = Once::new();

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn acquire_token(&self, for_host: &str) -> Result<Credential, TokenError> {
        match &self.token {
            Some(token) => Ok(Credential::new(token.clone())),
            None => {
                ANONYMOUS_WARNING.call_once(|| {
                    warn!(
                        host = for_host,
                        "No provider token configured, rate limits will be restricted"
                    );
                });
                Ok(Credential::anonymous())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenData {
    access_token: Option<String>,
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// Delegated credential exchange against an auth service
///
/// Built per inbound request because the forwarded bearer token belongs to
/// that request.
pub struct AuthServiceTokenProvider {
    http_client: Client,
    base_url: Url,
    bearer: Option<String>,
}

impl AuthServiceTokenProvider {
    /// Creates a provider that forwards `bearer` (without the `Bearer ` prefix)
    pub fn new(http_client: Client, base_url: &str, bearer: Option<String>) -> Result<Self, TokenError> {
        let base_url = Url::parse(base_url).map_err(|e| TokenError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url,
            bearer,
        })
    }

    /// Builds an HTTP client for auth service calls
    pub fn http_client(timeout: Duration) -> Result<Client, TokenError> {
        Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TokenError::Request(e.to_string()))
    }

    fn token_url(&self, for_host: &str) -> Result<Url, TokenError> {
        let mut url = self
            .base_url
            .join(TOKEN_PATH)
            .map_err(|e| TokenError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("for", &format!("https://{}", for_host));
        Ok(url)
    }
}

#[async_trait]
impl TokenProvider for AuthServiceTokenProvider {
    async fn acquire_token(&self, for_host: &str) -> Result<Credential, TokenError> {
        let url = self.token_url(for_host)?;
        debug!(%url, "Retrieving provider token from auth service");

        let mut request = self.http_client.get(url.clone());
        match &self.bearer {
            Some(bearer) => request = request.bearer_auth(bearer),
            None => debug!("No caller token to forward to auth service"),
        }

        let response = request.send().await.map_err(|e| {
            error!(%url, error = %e, "Auth service request failed");
            TokenError::Request(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(%url, status = status.as_u16(), for_host, "Auth service rejected token request");
            return Err(TokenError::Status {
                status: status.as_u16(),
            });
        }

        let data: TokenData = response.json().await.map_err(|e| {
            error!(error = %e, for_host, "Unable to parse auth service token");
            TokenError::InvalidResponse(e.to_string())
        })?;

        data.access_token
            .filter(|t| !t.is_empty())
            .map(Credential::new)
            .ok_or_else(|| TokenError::Missing(for_host.to_string()))
    }
}

impl fmt::Debug for AuthServiceTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthServiceTokenProvider")
            .field("base_url", &self.base_url.as_str())
            .field("forwards_bearer", &self.bearer.is_some())
            .finish()
    }
}
