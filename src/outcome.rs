//! Detection outcomes and failure taxonomy

use crate::catalog::BuildTool;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of ways a detection can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    InvalidReference,
    RepositoryOrBranchNotFound,
    UnsupportedHost,
    UpstreamUnavailable,
}

impl FailureKind {
    /// Stable message shown to API consumers
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::InvalidReference => "url is invalid",
            FailureKind::RepositoryOrBranchNotFound => "resource not found",
            FailureKind::UnsupportedHost => "unsupported service",
            FailureKind::UpstreamUnavailable => "unable to retrieve contents",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Detection failure with diagnostic context
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectError {
    #[error("invalid repository url '{url}': {reason}")]
    InvalidReference { url: String, reason: String },

    #[error("unsupported host '{host}'")]
    UnsupportedHost { host: String },

    #[error("repository {owner}/{repository} or branch '{branch}' not found")]
    RepositoryOrBranchNotFound {
        owner: String,
        repository: String,
        branch: String,
    },

    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },
}

impl DetectError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DetectError::InvalidReference { .. } => FailureKind::InvalidReference,
            DetectError::UnsupportedHost { .. } => FailureKind::UnsupportedHost,
            DetectError::RepositoryOrBranchNotFound { .. } => {
                FailureKind::RepositoryOrBranchNotFound
            }
            DetectError::UpstreamUnavailable { .. } => FailureKind::UpstreamUnavailable,
        }
    }

    pub(crate) fn invalid(url: &str, reason: impl Into<String>) -> Self {
        DetectError::InvalidReference {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn upstream(message: impl Into<String>) -> Self {
        DetectError::UpstreamUnavailable {
            message: message.into(),
        }
    }
}

/// Result of one detection request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    Resolved(BuildTool),
    Unknown,
    Failed(FailureKind),
}

impl DetectionOutcome {
    /// Wire identifier for successful outcomes
    pub fn build_tool_type(&self) -> Option<&'static str> {
        match self {
            DetectionOutcome::Resolved(tool) => Some(tool.id()),
            DetectionOutcome::Unknown => Some("unknown"),
            DetectionOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            DetectionOutcome::Failed(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<Result<Option<BuildTool>, DetectError>> for DetectionOutcome {
    fn from(result: Result<Option<BuildTool>, DetectError>) -> Self {
        match result {
            Ok(Some(tool)) => DetectionOutcome::Resolved(tool),
            Ok(None) => DetectionOutcome::Unknown,
            Err(e) => DetectionOutcome::Failed(e.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let err = DetectError::RepositoryOrBranchNotFound {
            owner: "acme".into(),
            repository: "widgets".into(),
            branch: "master".into(),
        };
        assert_eq!(err.kind(), FailureKind::RepositoryOrBranchNotFound);
        assert_eq!(
            err.to_string(),
            "repository acme/widgets or branch 'master' not found"
        );
        assert_eq!(
            DetectError::upstream("boom").kind(),
            FailureKind::UpstreamUnavailable
        );
    }

    #[test]
    fn test_outcome_from_result() {
        assert_eq!(
            DetectionOutcome::from(Ok(Some(BuildTool::Maven))),
            DetectionOutcome::Resolved(BuildTool::Maven)
        );
        assert_eq!(DetectionOutcome::from(Ok(None)), DetectionOutcome::Unknown);
        let failed = DetectionOutcome::from(Err(DetectError::invalid("x", "no host")));
        assert_eq!(failed.failure(), Some(FailureKind::InvalidReference));
        assert_eq!(failed.build_tool_type(), None);
    }

    #[test]
    fn test_build_tool_type_ids() {
        assert_eq!(
            DetectionOutcome::Resolved(BuildTool::NodeJs).build_tool_type(),
            Some("nodejs")
        );
        assert_eq!(DetectionOutcome::Unknown.build_tool_type(), Some("unknown"));
    }
}
