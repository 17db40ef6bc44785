//! Provider API contract
//!
//! The core only needs two existence checks from a git hosting provider: does
//! a branch exist, and does a path exist at a ref. [`ProviderClient`] captures
//! that contract so the probe can run against GitHub in production and against
//! scripted clients in tests.

pub mod github;
pub mod mock;

use crate::reference::RepositoryReference;
use crate::token::Credential;
use async_trait::async_trait;
use thiserror::Error;

pub use github::GitHubClient;
pub use mock::{MockAnswer, MockProviderClient};

/// Affirmative answer to an existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Found,
    NotFound,
}

/// Failure to get an answer from the provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider returned unexpected status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("provider request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("provider transport error: {message}")]
    Transport { message: String },

    #[error("invalid provider request: {message}")]
    InvalidRequest { message: String },
}

/// Minimal provider API used by the probe
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Checks that the repository and branch exist
    async fn branch_exists(
        &self,
        reference: &RepositoryReference,
        credential: &Credential,
    ) -> Result<ProbeStatus, ProviderError>;

    /// Checks that `path` exists at the reference's branch
    async fn content_exists(
        &self,
        reference: &RepositoryReference,
        path: &str,
        credential: &Credential,
    ) -> Result<ProbeStatus, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
