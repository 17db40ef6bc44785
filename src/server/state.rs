//! Shared application state

use crate::classify::UnavailablePolicy;
use crate::config::DetectorConfig;
use crate::service::{DetectionService, ServiceError};
use crate::token::{AuthServiceTokenProvider, StaticTokenProvider, TokenError, TokenProvider};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;

/// Where `/detect` gets its provider credential from
#[derive(Clone)]
pub enum TokenSource {
    /// One token for every request (or none)
    Static(Arc<StaticTokenProvider>),
    /// Exchange the caller's bearer token at the auth service
    AuthService { http_client: Client, base_url: String },
}

impl TokenSource {
    pub fn from_config(config: &DetectorConfig) -> Result<Self, TokenError> {
        match &config.auth_url {
            Some(base_url) => Ok(TokenSource::AuthService {
                http_client: AuthServiceTokenProvider::http_client(config.request_timeout())?,
                base_url: base_url.clone(),
            }),
            None => Ok(TokenSource::Static(Arc::new(StaticTokenProvider::new(
                config.github_token.clone(),
            )))),
        }
    }

    /// Token provider for one request, forwarding `bearer` when exchanging
    pub fn for_request(&self, bearer: Option<String>) -> Result<Arc<dyn TokenProvider>, TokenError> {
        match self {
            TokenSource::Static(provider) => Ok(provider.clone()),
            TokenSource::AuthService {
                http_client,
                base_url,
            } => Ok(Arc::new(AuthServiceTokenProvider::new(
                http_client.clone(),
                base_url,
                bearer,
            )?)),
        }
    }
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("TokenSource::Static"),
            TokenSource::AuthService { base_url, .. } => f
                .debug_struct("TokenSource::AuthService")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

/// State handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<DetectionService>,
    pub tokens: TokenSource,
    pub policy: UnavailablePolicy,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: Arc<DetectionService>, tokens: TokenSource, policy: UnavailablePolicy) -> Self {
        Self {
            service,
            tokens,
            policy,
            started_at: Utc::now(),
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self, ServiceError> {
        let service = DetectionService::from_config(config)?;
        let tokens = TokenSource::from_config(config)?;
        Ok(Self::new(Arc::new(service), tokens, config.unavailable_policy))
    }
}
