//! Command handlers; each returns the process exit code

use super::commands::{DetectArgs, ServeArgs};
use super::output::{OutputFormatter, Rendered, EXIT_BAD_INPUT};
use crate::config::DetectorConfig;
use crate::server::Server;
use crate::service::DetectionService;
use crate::token::StaticTokenProvider;
use anyhow::{Context, Result};
use tracing::{debug, error, info};

pub async fn handle_serve(args: &ServeArgs) -> i32 {
    match run_serve(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("Server failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

async fn run_serve(args: &ServeArgs) -> Result<()> {
    let config = serve_config(DetectorConfig::from_env(), args);
    config.validate().context("Invalid configuration")?;
    info!("{}", config);

    let server = Server::new(&config)
        .await
        .context("Failed to initialize server")?;
    server.run().await.context("Server terminated with an error")
}

fn serve_config(mut config: DetectorConfig, args: &ServeArgs) -> DetectorConfig {
    if let Some(host) = &args.host {
        config.bind_host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config
}

pub async fn handle_detect(args: &DetectArgs) -> i32 {
    match run_detect(args, DetectorConfig::from_env()).await {
        Ok(rendered) => {
            let code = rendered.exit_code();
            match rendered {
                Rendered::Stdout(text) => println!("{}", text),
                Rendered::Stderr { text, .. } => eprintln!("{}", text),
            }
            code
        }
        Err(e) => {
            error!("Detection could not run: {:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_BAD_INPUT
        }
    }
}

/// Runs one detection and renders it; errors are setup failures only
pub async fn run_detect(args: &DetectArgs, mut config: DetectorConfig) -> Result<Rendered> {
    if args.token.is_some() {
        config.github_token = args.token.clone();
    }
    debug!("Using configuration:\n{}", config);

    let service = DetectionService::from_config(&config).context("Failed to initialize detection service")?;
    let tokens = StaticTokenProvider::new(config.github_token.clone());

    let outcome = service
        .detect_with_tokens(&args.url, args.branch.as_deref(), &tokens)
        .await;
    let outcome = config.unavailable_policy.apply(outcome);

    OutputFormatter::new(args.pretty).render(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::{EXIT_NOT_FOUND, EXIT_OK};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> DetectorConfig {
        DetectorConfig {
            api_url: server.uri(),
            provider_host: "github.com".to_string(),
            default_branch: "master".to_string(),
            github_token: None,
            auth_url: None,
            ..DetectorConfig::default()
        }
    }

    fn detect_args(url: &str) -> DetectArgs {
        DetectArgs {
            url: url.to_string(),
            branch: None,
            token: None,
            pretty: false,
        }
    }

    #[test]
    fn test_serve_config_overrides() {
        let args = ServeArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(9191),
        };
        let config = serve_config(DetectorConfig::default(), &args);
        assert_eq!(config.bind_host, "127.0.0.1");
        assert_eq!(config.port, 9191);
    }

    #[tokio::test]
    async fn test_run_detect_nodejs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/branches/master"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/contents/package.json"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/contents/pom.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let rendered = run_detect(&detect_args("https://github.com/acme/widgets"), config_for(&server))
            .await
            .unwrap();
        assert_eq!(rendered.exit_code(), EXIT_OK);
        assert_eq!(
            rendered,
            Rendered::Stdout(r#"{"build-tool-type":"nodejs"}"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_run_detect_missing_branch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/branches/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut args = detect_args("https://github.com/acme/widgets");
        args.branch = Some("gone".to_string());
        let rendered = run_detect(&args, config_for(&server)).await.unwrap();
        assert_eq!(rendered.exit_code(), EXIT_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_detect_ignores_bind_settings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/branches/master"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let config = DetectorConfig {
            bind_host: "localhost".to_string(),
            ..config_for(&server)
        };
        let rendered = run_detect(&detect_args("https://github.com/acme/widgets"), config)
            .await
            .unwrap();
        assert_eq!(rendered.exit_code(), EXIT_OK);
    }

    #[tokio::test]
    async fn test_run_detect_rejects_bad_config() {
        let server = MockServer::start().await;
        let config = DetectorConfig {
            request_timeout_secs: 0,
            ..config_for(&server)
        };
        assert!(run_detect(&detect_args("https://github.com/acme/widgets"), config)
            .await
            .is_err());
    }
}
