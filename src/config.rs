//! Configuration management for the build tool detector
//!
//! Settings are loaded from environment variables with sensible defaults.
//! Command-line flags may override the bind address afterwards.
//!
//! # Environment Variables
//!
//! - `BTD_PROVIDER_HOST`: Supported repository host - default: "github.com"
//! - `BTD_API_URL`: Provider API base URL - default: "https://api.github.com"
//! - `BTD_DEFAULT_BRANCH`: Branch used when none is given - default: "master"
//! - `BTD_AUTH_URL`: Auth service used for delegated token exchange - optional
//! - `BTD_GITHUB_TOKEN` (or `GITHUB_TOKEN`): Static provider token - optional
//! - `BTD_REQUEST_TIMEOUT`: Per provider request timeout in seconds - default: "10"
//! - `BTD_DETECT_TIMEOUT`: Deadline for a whole detection in seconds - default: "30"
//! - `BTD_HOST` / `BTD_PORT`: HTTP bind address - default: "0.0.0.0" / "8080"
//! - `BTD_DEGRADE_TO_UNKNOWN`: Report provider outages as "unknown" (true|false) - default: "false"
//! - `BTD_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use build_tool_detector::DetectorConfig;
//!
//! let config = DetectorConfig::from_env();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::classify::UnavailablePolicy;
use crate::provider::github::DEFAULT_API_URL;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_PROVIDER_HOST: &str = "github.com";
const DEFAULT_BRANCH: &str = "master";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DETECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_TIMEOUT_SECS: u64 = 600;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Detector configuration
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// The single repository host accepted in URLs
    pub provider_host: String,

    /// Provider API base URL
    pub api_url: String,

    /// Branch used when neither an override nor a URL branch is present
    pub default_branch: String,

    /// Auth service for delegated token exchange
    pub auth_url: Option<String>,

    /// Static provider token, used when no auth service is configured
    pub github_token: Option<String>,

    /// Per provider request timeout in seconds
    pub request_timeout_secs: u64,

    /// Deadline for one whole detection in seconds
    pub detect_timeout_secs: u64,

    pub bind_host: String,
    pub port: u16,

    /// How provider outages are reported
    pub unavailable_policy: UnavailablePolicy,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for DetectorConfig {
    /// Loads configuration from `BTD_*` environment variables, falling back to
    /// defaults for anything unset or unparsable
    fn default() -> Self {
        let provider_host = env_string("BTD_PROVIDER_HOST")
            .unwrap_or_else(|| DEFAULT_PROVIDER_HOST.to_string())
            .to_lowercase();

        let api_url = env_string("BTD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let default_branch =
            env_string("BTD_DEFAULT_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let auth_url = env_string("BTD_AUTH_URL");

        let github_token = env_string("BTD_GITHUB_TOKEN").or_else(|| env_string("GITHUB_TOKEN"));

        let request_timeout_secs = env_string("BTD_REQUEST_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let detect_timeout_secs = env_string("BTD_DETECT_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_DETECT_TIMEOUT_SECS);

        let bind_host = env_string("BTD_HOST").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());

        let port = env_string("BTD_PORT")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let unavailable_policy = match env_string("BTD_DEGRADE_TO_UNKNOWN")
            .and_then(|v| v.parse::<bool>().ok())
        {
            Some(true) => UnavailablePolicy::DegradeToUnknown,
            _ => UnavailablePolicy::Strict,
        };

        let log_level = env_string("BTD_LOG_LEVEL")
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            provider_host,
            api_url,
            default_branch,
            auth_url,
            github_token,
            request_timeout_secs,
            detect_timeout_secs,
            bind_host,
            port,
            unavailable_policy,
            log_level,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl DetectorConfig {
    /// Same as `Default::default()`, spelled out at call sites that read the
    /// environment on purpose
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any validation fails
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_host.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Provider host must not be empty".to_string(),
            ));
        }

        if self.default_branch.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Default branch must not be empty".to_string(),
            ));
        }

        for (name, secs) in [
            ("Request timeout", self.request_timeout_secs),
            ("Detection timeout", self.detect_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be at least 1 second",
                    name
                )));
            }
            if secs > MAX_TIMEOUT_SECS {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} cannot exceed 10 minutes",
                    name
                )));
            }
        }

        Url::parse(&self.api_url).map_err(|e| ConfigError::ParseError {
            field: "BTD_API_URL".to_string(),
            error: e.to_string(),
        })?;

        if let Some(auth_url) = &self.auth_url {
            Url::parse(auth_url).map_err(|e| ConfigError::ParseError {
                field: "BTD_AUTH_URL".to_string(),
                error: e.to_string(),
            })?;
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Resolves the HTTP bind address; `bind_host` may be a hostname
    ///
    /// Only `serve` needs this, so it is not part of [`validate`](Self::validate).
    pub async fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind_error = |error: String| ConfigError::ParseError {
            field: "BTD_HOST".to_string(),
            error,
        };
        tokio::net::lookup_host((self.bind_host.as_str(), self.port))
            .await
            .map_err(|e| bind_error(e.to_string()))?
            .next()
            .ok_or_else(|| bind_error(format!("'{}' did not resolve to an address", self.bind_host)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn detect_timeout(&self) -> Duration {
        Duration::from_secs(self.detect_timeout_secs)
    }
}

impl fmt::Display for DetectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Build Tool Detector Configuration:")?;
        writeln!(f, "  Provider Host: {}", self.provider_host)?;
        writeln!(f, "  API URL: {}", self.api_url)?;
        writeln!(f, "  Default Branch: {}", self.default_branch)?;
        match &self.auth_url {
            Some(url) => writeln!(f, "  Auth Service: {}", url)?,
            None => writeln!(
                f,
                "  Static Token: {}",
                if self.github_token.is_some() { "set" } else { "unset" }
            )?,
        }
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Detection Timeout: {}s", self.detect_timeout_secs)?;
        writeln!(f, "  Bind: {}:{}", self.bind_host, self.port)?;
        writeln!(f, "  Unavailable Policy: {:?}", self.unavailable_policy)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
