//! build-tool-detector - build tool detection for hosted git repositories
//!
//! Given a repository URL (and optionally a branch), the detector checks
//! which build tool marker files exist at that branch on the provider and
//! reports the build tool: `maven`, `nodejs` or `unknown`.
//!
//! # Core Concepts
//!
//! - **Reference**: the `(owner, repository, branch)` triple resolved from a URL
//!   by [`ReferenceResolver`]; malformed or foreign URLs are rejected before
//!   any network call
//! - **Catalog**: the ordered marker files probed per request
//!   ([`BuildTypeCatalog`])
//! - **Probe**: one branch existence check, then one concurrent content check
//!   per catalog entry ([`ProviderProbe`])
//! - **Outcome**: [`DetectionOutcome`] is `Resolved`, `Unknown` or
//!   `Failed(FailureKind)`; [`classify`](classify::classify) maps failures to
//!   bad request / not found / unavailable
//!
//! # Example Usage
//!
//! ```no_run
//! use build_tool_detector::{DetectionOutcome, DetectionService, DetectorConfig, StaticTokenProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DetectorConfig::from_env();
//! let service = DetectionService::from_config(&config)?;
//! let tokens = StaticTokenProvider::new(config.github_token.clone());
//!
//! match service
//!     .detect_with_tokens("https://github.com/acme/widgets/tree/dev", None, &tokens)
//!     .await
//! {
//!     DetectionOutcome::Resolved(tool) => println!("build tool: {}", tool),
//!     DetectionOutcome::Unknown => println!("no known marker file"),
//!     DetectionOutcome::Failed(kind) => eprintln!("failed: {}", kind),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`reference`], [`catalog`], [`probe`], [`service`]: the detection core
//! - [`provider`]: provider API contract and the GitHub client
//! - [`token`]: credential acquisition
//! - [`server`], [`cli`]: the HTTP and command-line front ends

pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod outcome;
pub mod probe;
pub mod provider;
pub mod reference;
pub mod server;
pub mod service;
pub mod token;
pub mod util;

pub use catalog::{BuildTool, BuildTypeCandidate, BuildTypeCatalog};
pub use classify::{classify, ExternalStatus, UnavailablePolicy};
pub use config::{ConfigError, DetectorConfig};
pub use outcome::{DetectError, DetectionOutcome, FailureKind};
pub use probe::ProviderProbe;
pub use provider::{GitHubClient, ProbeStatus, ProviderClient, ProviderError};
pub use reference::{ReferenceResolver, RepositoryReference};
pub use service::{DetectionService, ServiceError};
pub use token::{AuthServiceTokenProvider, Credential, StaticTokenProvider, TokenError, TokenProvider};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
