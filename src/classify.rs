//! Mapping from internal failure kinds to external status classes

use crate::outcome::{DetectionOutcome, FailureKind};
use serde::{Deserialize, Serialize};

/// Status class surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExternalStatus {
    BadRequest,
    NotFound,
    InternalUnavailable,
}

impl ExternalStatus {
    pub fn status_code(&self) -> u16 {
        match self {
            ExternalStatus::BadRequest => 400,
            ExternalStatus::NotFound => 404,
            ExternalStatus::InternalUnavailable => 500,
        }
    }
}

/// Classifies a failure kind
///
/// An unsupported host is a capability gap on the server side rather than a
/// malformed request, so it lands in `InternalUnavailable`.
pub fn classify(kind: FailureKind) -> ExternalStatus {
    match kind {
        FailureKind::InvalidReference => ExternalStatus::BadRequest,
        FailureKind::RepositoryOrBranchNotFound => ExternalStatus::NotFound,
        FailureKind::UnsupportedHost => ExternalStatus::InternalUnavailable,
        FailureKind::UpstreamUnavailable => ExternalStatus::InternalUnavailable,
    }
}

/// How an `UpstreamUnavailable` failure is surfaced to end users
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnavailablePolicy {
    /// Report the failure as `InternalUnavailable`
    #[default]
    Strict,
    /// Report the build tool as unknown instead of failing
    DegradeToUnknown,
}

impl UnavailablePolicy {
    /// Applies the policy to a finished outcome
    pub fn apply(&self, outcome: DetectionOutcome) -> DetectionOutcome {
        match (self, outcome) {
            (
                UnavailablePolicy::DegradeToUnknown,
                DetectionOutcome::Failed(FailureKind::UpstreamUnavailable),
            ) => DetectionOutcome::Unknown,
            (_, outcome) => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuildTool;
    use yare::parameterized;

    #[parameterized(
        invalid = { FailureKind::InvalidReference, ExternalStatus::BadRequest, 400 },
        not_found = { FailureKind::RepositoryOrBranchNotFound, ExternalStatus::NotFound, 404 },
        unsupported = { FailureKind::UnsupportedHost, ExternalStatus::InternalUnavailable, 500 },
        upstream = { FailureKind::UpstreamUnavailable, ExternalStatus::InternalUnavailable, 500 },
    )]
    fn test_classify(kind: FailureKind, expected: ExternalStatus, code: u16) {
        let status = classify(kind);
        assert_eq!(status, expected);
        assert_eq!(status.status_code(), code);
    }

    #[test]
    fn test_strict_policy_keeps_failure() {
        let outcome = DetectionOutcome::Failed(FailureKind::UpstreamUnavailable);
        assert_eq!(UnavailablePolicy::Strict.apply(outcome), outcome);
    }

    #[test]
    fn test_degrade_policy_only_touches_upstream_failures() {
        let policy = UnavailablePolicy::DegradeToUnknown;
        assert_eq!(
            policy.apply(DetectionOutcome::Failed(FailureKind::UpstreamUnavailable)),
            DetectionOutcome::Unknown
        );
        assert_eq!(
            policy.apply(DetectionOutcome::Failed(FailureKind::RepositoryOrBranchNotFound)),
            DetectionOutcome::Failed(FailureKind::RepositoryOrBranchNotFound)
        );
        assert_eq!(
            policy.apply(DetectionOutcome::Resolved(BuildTool::Maven)),
            DetectionOutcome::Resolved(BuildTool::Maven)
        );
    }
}
