//! Route handlers

use super::error::ApiError;
use super::state::AppState;
use crate::outcome::{DetectionOutcome, FailureKind};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
pub struct DetectQuery {
    pub url: Option<String>,
    pub branch: Option<String>,
}

/// Successful `/detect` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectResponse {
    #[serde(rename = "build-tool-type")]
    pub build_tool_type: String,
}

impl DetectResponse {
    /// Renders a successful outcome; `None` for failures
    pub fn from_outcome(outcome: &DetectionOutcome) -> Option<Self> {
        outcome.build_tool_type().map(|id| Self {
            build_tool_type: id.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub commit: Option<String>,
    pub build_time: Option<String>,
    pub start_time: DateTime<Utc>,
}

/// `GET /detect?url=<repository url>&branch=<optional branch>`
pub async fn detect(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<DetectQuery>, QueryRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        debug!(error = %rejection, "Rejecting /detect with malformed query");
        ApiError(FailureKind::InvalidReference)
    })?;
    let Some(url) = query.url.as_deref().filter(|u| !u.trim().is_empty()) else {
        debug!("Rejecting /detect without url parameter");
        return Err(ApiError(FailureKind::InvalidReference));
    };

    let tokens = state.tokens.for_request(bearer_token(&headers)).map_err(|e| {
        warn!(error = %e, "Unable to set up token provider");
        ApiError(FailureKind::UpstreamUnavailable)
    })?;

    let outcome = state
        .service
        .detect_with_tokens(url, query.branch.as_deref(), tokens.as_ref())
        .await;

    let outcome = state.policy.apply(outcome);
    match DetectResponse::from_outcome(&outcome) {
        Some(body) => Ok(Json(body)),
        None => Err(ApiError(
            outcome.failure().unwrap_or(FailureKind::UpstreamUnavailable),
        )),
    }
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        commit: option_env!("BTD_GIT_COMMIT").map(str::to_string),
        build_time: option_env!("BTD_BUILD_TIME").map(str::to_string),
        start_time: state.started_at,
    })
}

/// Caller token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}
