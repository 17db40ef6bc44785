//! Detection service orchestration
//!
//! `DetectionService` is the entry point of the core. It wires the pieces in
//! order:
//!
//! 1. resolve the URL and branch into a repository reference (pure, no I/O)
//! 2. obtain a credential, either supplied directly or from a [`TokenProvider`]
//! 3. run the provider probe with the full catalog
//!
//! A resolution failure ends the request before any provider call. The whole
//! detection is bounded by a deadline; when it expires the in-flight probe is
//! dropped, which aborts its outstanding tasks, and the outcome is
//! `UpstreamUnavailable`.
//!
//! # Example
//!
//! ```no_run
//! use build_tool_detector::{DetectionService, DetectorConfig, StaticTokenProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DetectorConfig::from_env();
//! let service = DetectionService::from_config(&config)?;
//! let tokens = StaticTokenProvider::new(config.github_token.clone());
//!
//! let outcome = service
//!     .detect_with_tokens("https://github.com/acme/widgets", None, &tokens)
//!     .await;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

use crate::catalog::{BuildTool, BuildTypeCatalog};
use crate::config::{ConfigError, DetectorConfig};
use crate::outcome::{DetectError, DetectionOutcome};
use crate::probe::ProviderProbe;
use crate::provider::{GitHubClient, ProviderClient, ProviderError};
use crate::reference::{ReferenceResolver, RepositoryReference};
use crate::token::{Credential, TokenError, TokenProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while building a detection service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider client error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Token provider error: {0}")]
    Token(#[from] TokenError),
}

/// Orchestrates resolution, credential acquisition and probing
pub struct DetectionService<P: ?Sized = dyn ProviderClient> {
    resolver: ReferenceResolver,
    catalog: BuildTypeCatalog,
    probe: ProviderProbe<P>,
    deadline: Option<Duration>,
}

impl<P: ProviderClient + ?Sized + 'static> std::fmt::Debug for DetectionService<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionService")
            .field("provider", &self.probe.client().name())
            .field("provider_host", &self.resolver.provider_host())
            .field("default_branch", &self.resolver.default_branch())
            .field("candidates", &self.catalog.len())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl DetectionService {
    /// Creates a GitHub-backed service from configuration
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the configuration is invalid or the HTTP
    /// client cannot be built
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let client: Arc<dyn ProviderClient> =
            Arc::new(GitHubClient::new(&config.api_url, config.request_timeout())?);
        info!(api_url = %config.api_url, host = %config.provider_host, "Detection service initialized with GitHub provider");

        Ok(Self::new(
            ReferenceResolver::new(config.provider_host.clone(), config.default_branch.clone()),
            BuildTypeCatalog::default(),
            client,
        )
        .with_deadline(config.detect_timeout()))
    }
}

impl<P> DetectionService<P>
where
    P: ProviderClient + ?Sized + 'static,
{
    pub fn new(resolver: ReferenceResolver, catalog: BuildTypeCatalog, client: Arc<P>) -> Self {
        Self {
            resolver,
            catalog,
            probe: ProviderProbe::new(client),
            deadline: None,
        }
    }

    /// Bounds every detection by `deadline`
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    pub fn catalog(&self) -> &BuildTypeCatalog {
        &self.catalog
    }

    /// Resolves the URL without touching the provider
    pub fn resolve(
        &self,
        raw_url: &str,
        branch_override: Option<&str>,
    ) -> Result<RepositoryReference, DetectError> {
        self.resolver.resolve(raw_url, branch_override)
    }

    /// Detects the build tool with a caller-supplied credential
    pub async fn detect(
        &self,
        raw_url: &str,
        branch_override: Option<&str>,
        credential: &Credential,
    ) -> DetectionOutcome {
        let started = Instant::now();
        let result = match self.resolve(raw_url, branch_override) {
            Ok(reference) => {
                self.bounded(self.probe.try_probe(&reference, &self.catalog, credential))
                    .await
            }
            Err(e) => Err(e),
        };
        self.finish(raw_url, result, started)
    }

    /// Detects the build tool, acquiring the credential from `tokens`
    ///
    /// The token is only requested once the URL resolved, so malformed or
    /// unsupported URLs never reach the token provider either. A token
    /// failure is reported as `UpstreamUnavailable`.
    pub async fn detect_with_tokens(
        &self,
        raw_url: &str,
        branch_override: Option<&str>,
        tokens: &dyn TokenProvider,
    ) -> DetectionOutcome {
        let started = Instant::now();
        let result = match self.resolve(raw_url, branch_override) {
            Ok(reference) => {
                self.bounded(async {
                    let credential = tokens
                        .acquire_token(self.resolver.provider_host())
                        .await
                        .map_err(|e| {
                            warn!(%reference, error = %e, "Unable to acquire provider token");
                            DetectError::upstream(format!("token acquisition failed: {}", e))
                        })?;
                    self.probe
                        .try_probe(&reference, &self.catalog, &credential)
                        .await
                })
                .await
            }
            Err(e) => Err(e),
        };
        self.finish(raw_url, result, started)
    }

    async fn bounded<F>(&self, work: F) -> Result<Option<BuildTool>, DetectError>
    where
        F: std::future::Future<Output = Result<Option<BuildTool>, DetectError>>,
    {
        match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, work).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(?deadline, "Detection deadline expired");
                    Err(DetectError::upstream(format!(
                        "detection exceeded deadline of {:?}",
                        deadline
                    )))
                }
            },
            None => work.await,
        }
    }

    fn finish(
        &self,
        raw_url: &str,
        result: Result<Option<BuildTool>, DetectError>,
        started: Instant,
    ) -> DetectionOutcome {
        let elapsed = started.elapsed();
        match &result {
            Ok(tool) => info!(
                url = raw_url,
                build_tool = tool.map(|t| t.id()).unwrap_or("unknown"),
                "Detection completed in {:.2}s",
                elapsed.as_secs_f64()
            ),
            Err(e) => debug!(
                url = raw_url,
                kind = ?e.kind(),
                error = %e,
                "Detection failed after {:.2}s",
                elapsed.as_secs_f64()
            ),
        }
        result.into()
    }
}
