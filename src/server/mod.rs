//! HTTP surface
//!
//! Two routes:
//!
//! - `GET /detect?url=<url>&branch=<branch>` runs one detection
//! - `GET /status` reports build metadata and start time
//!
//! Every response carries an `x-request-id`; requests are traced through
//! `tower-http` and CORS allows `GET` from any origin.

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ErrorBody, ServerError, ServerResult};
pub use handlers::{DetectResponse, StatusResponse};
pub use state::{AppState, TokenSource};

use crate::config::DetectorConfig;
use axum::{
    http::{header, HeaderName, Method},
    routing::get,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

const REQUEST_ID_HEADER: &str = "x-request-id";
const CORS_MAX_AGE: Duration = Duration::from_secs(600);

/// Detection HTTP server
pub struct Server {
    addr: SocketAddr,
    app: Router,
}

impl Server {
    /// Builds the server from configuration, including the GitHub provider
    pub async fn new(config: &DetectorConfig) -> ServerResult<Self> {
        let addr = config.bind_addr().await?;
        let state = AppState::from_config(config)?;
        Ok(Self::with_state(addr, state))
    }

    /// Builds the server around an existing state (custom providers, tests)
    pub fn with_state(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            app: router(state),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds the configured address and serves until Ctrl-C
    pub async fn run(self) -> ServerResult<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: tokio::net::TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Starting server on {}", listener.local_addr()?);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Internal(format!("HTTP server error: {err}")))?;
        info!("Server stopped");
        Ok(())
    }
}

/// Builds the router with routes and middleware
pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let middleware_stack = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers([request_id, header::CONTENT_TYPE, header::AUTHORIZATION])
                .max_age(CORS_MAX_AGE),
        );

    Router::new()
        .route("/detect", get(handlers::detect))
        .route("/status", get(handlers::status))
        .with_state(state)
        .layer(middleware_stack)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuildTypeCatalog;
    use crate::classify::UnavailablePolicy;
    use crate::provider::{MockAnswer, MockProviderClient, ProviderClient, ProviderError};
    use crate::reference::ReferenceResolver;
    use crate::service::DetectionService;
    use crate::token::StaticTokenProvider;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(mock: MockProviderClient, policy: UnavailablePolicy) -> (Router, Arc<MockProviderClient>) {
        let mock = Arc::new(mock);
        let client: Arc<dyn ProviderClient> = mock.clone();
        let service = DetectionService::new(
            ReferenceResolver::new("github.com", "master"),
            BuildTypeCatalog::default(),
            client,
        );
        let tokens = TokenSource::Static(Arc::new(StaticTokenProvider::new(Some("ghp_test".into()))));
        let state = AppState::new(Arc::new(service), tokens, policy);
        (router(state), mock)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_detect_maven() {
        let mock = MockProviderClient::new();
        mock.set_content("pom.xml", MockAnswer::found());
        let (app, mock) = app_with(mock, UnavailablePolicy::Strict);

        let (status, body) = get_json(app, "/detect?url=https://github.com/acme/widgets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"build-tool-type": "maven"}));
        assert_eq!(mock.credentials_seen()[0].expose(), "ghp_test");
    }

    #[tokio::test]
    async fn test_detect_unknown() {
        let (app, _) = app_with(MockProviderClient::new(), UnavailablePolicy::Strict);
        let (status, body) = get_json(app, "/detect?url=https://github.com/acme/widgets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["build-tool-type"], "unknown");
    }

    #[tokio::test]
    async fn test_detect_missing_url() {
        let (app, mock) = app_with(MockProviderClient::new(), UnavailablePolicy::Strict);
        let (status, body) = get_json(app, "/detect").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "url is invalid");
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_detect_malformed_query_is_json_bad_request() {
        let (app, mock) = app_with(MockProviderClient::new(), UnavailablePolicy::Strict);
        let (status, body) = get_json(
            app,
            "/detect?url=https://github.com/acme/widgets&url=https://github.com/acme/gadgets",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({
                "status_code": 400,
                "status": "Bad Request",
                "error": "url is invalid"
            })
        );
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_detect_unsupported_host() {
        let (app, mock) = app_with(MockProviderClient::new(), UnavailablePolicy::Strict);
        let (status, body) = get_json(app, "/detect?url=https://gitlab.com/acme/widgets").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            serde_json::json!({
                "status_code": 500,
                "status": "Internal Server Error",
                "error": "unsupported service"
            })
        );
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_detect_missing_branch() {
        let mock = MockProviderClient::new();
        mock.set_branch(MockAnswer::not_found());
        let (app, _) = app_with(mock, UnavailablePolicy::Strict);

        let (status, body) =
            get_json(app, "/detect?url=https://github.com/acme/widgets&branch=gone").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status_code"], 404);
        assert_eq!(body["error"], "resource not found");
    }

    #[tokio::test]
    async fn test_detect_upstream_failure_strict_and_degraded() {
        let outage = || {
            let mock = MockProviderClient::new();
            mock.set_content("pom.xml", MockAnswer::error(ProviderError::UnexpectedStatus { status: 502 }));
            mock.set_content("package.json", MockAnswer::error(ProviderError::UnexpectedStatus { status: 502 }));
            mock
        };

        let (app, _) = app_with(outage(), UnavailablePolicy::Strict);
        let (status, body) = get_json(app, "/detect?url=https://github.com/acme/widgets").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "unable to retrieve contents");

        let (app, _) = app_with(outage(), UnavailablePolicy::DegradeToUnknown);
        let (status, body) = get_json(app, "/detect?url=https://github.com/acme/widgets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["build-tool-type"], "unknown");
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (app, _) = app_with(MockProviderClient::new(), UnavailablePolicy::Strict);
        let (status, body) = get_json(app, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("commit").is_some());
        assert!(body.get("build_time").is_some());
        assert!(body["start_time"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_request_id_is_set() {
        let (app, _) = app_with(MockProviderClient::new(), UnavailablePolicy::Strict);
        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let (app, _) = app_with(MockProviderClient::new(), UnavailablePolicy::Strict);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (app, _) = app_with(MockProviderClient::new(), UnavailablePolicy::Strict);
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/detect")
                    .header(header::ORIGIN, "https://dashboard.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "600");
    }
}
