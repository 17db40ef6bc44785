//! Repository reference resolution
//!
//! Turns a repository URL plus an optional branch override into the
//! `(owner, repository, branch)` triple used for provider calls. Resolution is
//! pure: no I/O happens here, so malformed or unsupported URLs are rejected
//! before any network call.
//!
//! Branch precedence:
//! 1. the explicit override, whatever the URL looks like
//! 2. a `/tree/<branch>` segment embedded in the URL path
//! 3. the configured default branch

use crate::outcome::DetectError;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::fmt;
use tracing::warn;
use url::Url;

const TREE_MARKER: &str = "tree";

/// Resolved `(owner, repository, branch)` triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReference {
    owner: String,
    repository: String,
    branch: String,
}

impl RepositoryReference {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repository, self.branch)
    }
}

/// Parses repository URLs for the single supported provider host
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    provider_host: String,
    default_branch: String,
}

impl ReferenceResolver {
    pub fn new(provider_host: impl Into<String>, default_branch: impl Into<String>) -> Self {
        Self {
            provider_host: provider_host.into(),
            default_branch: default_branch.into(),
        }
    }

    pub fn provider_host(&self) -> &str {
        &self.provider_host
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// Resolves `raw_url` into a repository reference
    ///
    /// An empty or blank `branch_override` counts as absent.
    ///
    /// # Errors
    ///
    /// - `DetectError::InvalidReference` when the URL does not parse, has no
    ///   scheme or host, or lacks an owner and repository segment
    /// - `DetectError::UnsupportedHost` when the host is not the provider host
    pub fn resolve(
        &self,
        raw_url: &str,
        branch_override: Option<&str>,
    ) -> Result<RepositoryReference, DetectError> {
        let parsed = Url::parse(raw_url.trim()).map_err(|e| {
            warn!(url = raw_url, error = %e, "Rejected unparsable repository url");
            DetectError::invalid(raw_url, e.to_string())
        })?;

        if parsed.scheme().is_empty() {
            return Err(DetectError::invalid(raw_url, "missing scheme"));
        }

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => {
                warn!(url = raw_url, "Rejected repository url without host");
                return Err(DetectError::invalid(raw_url, "missing host"));
            }
        };

        if !host.eq_ignore_ascii_case(&self.provider_host) {
            warn!(url = raw_url, host, "Rejected repository url for unsupported host");
            return Err(DetectError::UnsupportedHost {
                host: host.to_string(),
            });
        }

        let segments = parsed
            .path()
            .split('/')
            .map(|segment| decode_segment(raw_url, segment))
            .collect::<Result<Vec<String>, DetectError>>()?;
        if segments.len() < 3 {
            warn!(url = raw_url, "Rejected repository url without owner and repository");
            return Err(DetectError::invalid(raw_url, "expected /<owner>/<repository>"));
        }

        let owner = segments[1].as_str();
        let repository = segments[2].strip_suffix(".git").unwrap_or(&segments[2]);
        if owner.is_empty() || repository.is_empty() {
            warn!(url = raw_url, "Rejected repository url with empty owner or repository");
            return Err(DetectError::invalid(raw_url, "expected /<owner>/<repository>"));
        }

        let branch = match branch_override.map(str::trim).filter(|b| !b.is_empty()) {
            Some(explicit) => explicit,
            None => segments
                .get(3)
                .filter(|s| s.as_str() == TREE_MARKER)
                .and_then(|_| segments.get(4))
                .map(String::as_str)
                .filter(|b| !b.is_empty())
                .unwrap_or(self.default_branch.as_str()),
        };

        Ok(RepositoryReference {
            owner: owner.to_string(),
            repository: repository.to_string(),
            branch: branch.to_string(),
        })
    }
}

/// Percent-decodes one path segment; provider calls re-encode it
fn decode_segment(raw_url: &str, segment: &str) -> Result<String, DetectError> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            warn!(url = raw_url, segment, "Rejected repository url with non UTF-8 path segment");
            DetectError::invalid(raw_url, format!("path segment is not valid UTF-8: {}", e))
        })
}
