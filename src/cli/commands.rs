use clap::{Args, Parser, Subcommand};

/// Detects the build tool of a hosted git repository from its marker files
#[derive(Parser, Debug)]
#[command(
    name = "build-tool-detector",
    about = "Detects the build tool of a hosted git repository",
    version,
    author,
    long_about = "build-tool-detector checks which build tool marker files (pom.xml, \
                  package.json) exist at a branch of a GitHub repository. It runs either \
                  as an HTTP service or as a one-shot command."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the HTTP service",
        long_about = "Serves GET /detect and GET /status.\n\n\
                      Examples:\n  \
                      build-tool-detector serve\n  \
                      build-tool-detector serve --port 9090"
    )]
    Serve(ServeArgs),

    #[command(
        about = "Detect the build tool of one repository",
        long_about = "Prints {\"build-tool-type\": ...} on success, or the error body on stderr \
                      with exit code 1 (bad input), 2 (not found) or 3 (unavailable).\n\n\
                      Examples:\n  \
                      build-tool-detector detect https://github.com/acme/widgets\n  \
                      build-tool-detector detect https://github.com/acme/widgets/tree/dev\n  \
                      build-tool-detector detect https://github.com/acme/widgets --branch main"
    )]
    Detect(DetectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, value_name = "HOST", help = "Bind address (overrides BTD_HOST)")]
    pub host: Option<String>,

    #[arg(short = 'p', long, value_name = "PORT", help = "Listen port (overrides BTD_PORT)")]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    #[arg(value_name = "URL", help = "Repository URL, e.g. https://github.com/owner/repo")]
    pub url: String,

    #[arg(short = 'b', long, value_name = "BRANCH", help = "Branch to inspect")]
    pub branch: Option<String>,

    #[arg(
        long,
        value_name = "TOKEN",
        env = "BTD_GITHUB_TOKEN",
        hide_env_values = true,
        help = "Provider access token"
    )]
    pub token: Option<String>,

    #[arg(long, help = "Pretty-print JSON output")]
    pub pretty: bool,
}
