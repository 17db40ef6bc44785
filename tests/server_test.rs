//! HTTP server tests over a real socket
//!
//! The server runs on an ephemeral port with its GitHub API pointed at a
//! wiremock server; requests go through reqwest like any other client.

use build_tool_detector::server::{AppState, DetectResponse, ErrorBody, Server, TokenSource};
use build_tool_detector::{
    BuildTypeCatalog, DetectionService, GitHubClient, ProviderClient, ReferenceResolver,
    StaticTokenProvider, UnavailablePolicy,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct RunningServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RunningServer {
    fn url(&self, route: &str) -> String {
        format!("http://{}{}", self.addr, route)
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not shut down")
            .unwrap();
    }
}

async fn start(github: &MockServer, policy: UnavailablePolicy) -> RunningServer {
    let client: Arc<dyn ProviderClient> =
        Arc::new(GitHubClient::new(&github.uri(), Duration::from_secs(5)).unwrap());
    let service = DetectionService::new(
        ReferenceResolver::new("github.com", "master"),
        BuildTypeCatalog::default(),
        client,
    )
    .with_deadline(Duration::from_secs(10));
    let tokens = TokenSource::Static(Arc::new(StaticTokenProvider::new(None)));
    let state = AppState::new(Arc::new(service), tokens, policy);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::with_state(addr, state);

    let (shutdown, signal) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = signal.await;
            })
            .await
            .unwrap();
    });

    RunningServer {
        addr,
        shutdown,
        handle,
    }
}

async fn mount(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_detect_over_http() {
    let github = MockServer::start().await;
    mount(&github, "/repos/acme/widgets/branches/release", 200).await;
    mount(&github, "/repos/acme/widgets/contents/pom.xml", 200).await;
    mount(&github, "/repos/acme/widgets/contents/package.json", 404).await;

    let server = start(&github, UnavailablePolicy::Strict).await;
    let response = reqwest::Client::new()
        .get(server.url("/detect"))
        .query(&[
            ("url", "https://github.com/acme/widgets"),
            ("branch", "release"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));
    let body: DetectResponse = response.json().await.unwrap();
    assert_eq!(body.build_tool_type, "maven");

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_url_over_http() {
    let github = MockServer::start().await;
    let server = start(&github, UnavailablePolicy::Strict).await;

    let response = reqwest::Client::new()
        .get(server.url("/detect"))
        .query(&[("url", "https://github.com/acme")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.status_code, 400);
    assert_eq!(body.status, "Bad Request");
    assert_eq!(body.error, "url is invalid");

    server.stop().await;
}

#[tokio::test]
async fn test_outage_degrades_when_configured() {
    let github = MockServer::start().await;
    mount(&github, "/repos/acme/widgets/branches/master", 500).await;

    let strict = start(&github, UnavailablePolicy::Strict).await;
    let response = reqwest::get(format!(
        "{}?url=https://github.com/acme/widgets",
        strict.url("/detect")
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), 500);
    strict.stop().await;

    let degraded = start(&github, UnavailablePolicy::DegradeToUnknown).await;
    let response = reqwest::get(format!(
        "{}?url=https://github.com/acme/widgets",
        degraded.url("/detect")
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), 200);
    let body: DetectResponse = response.json().await.unwrap();
    assert_eq!(body.build_tool_type, "unknown");
    degraded.stop().await;
}

#[tokio::test]
async fn test_status_over_http() {
    let github = MockServer::start().await;
    let server = start(&github, UnavailablePolicy::Strict).await;

    let response = reqwest::get(server.url("/status")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let start_time = body["start_time"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(start_time).is_ok());

    server.stop().await;
}
