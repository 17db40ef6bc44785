//! Structured logging setup
//!
//! Wraps the `tracing` subscriber configuration shared by the `serve` and
//! `detect` commands. Console output goes to stderr so that `detect` can keep
//! stdout for its JSON result.
//!
//! # Example
//!
//! ```no_run
//! use build_tool_detector::util::logging;
//!
//! logging::init_from_env();
//!
//! tracing::info!(port = 8080, "listening");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Crates whose chatter is capped at `warn` unless `RUST_LOG` says otherwise
const NOISY_CRATES: &[&str] = &["h2", "hyper", "hyper_util", "reqwest"];

/// Crates that follow the crate level; `TraceLayer` request spans live here
const FOLLOWING_CRATES: &[&str] = &["tower_http"];

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for this crate's own events
    pub level: Level,

    /// Emit one JSON object per line instead of the pretty console format
    pub use_json: bool,

    /// Include the module target (e.g., build_tool_detector::probe)
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with full metadata, for log shippers in front of the server
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            ..Default::default()
        }
    }

    /// Builds the filter: `RUST_LOG` first, then the crate level (shared with
    /// request tracing) and the caps on noisy dependencies when `RUST_LOG` is
    /// unset.
    pub fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_ok() {
            return filter;
        }

        let own = format!("build_tool_detector={}", self.level);
        for directive in std::iter::once(own)
            .chain(FOLLOWING_CRATES.iter().map(|krate| format!("{}={}", krate, self.level)))
            .chain(NOISY_CRATES.iter().map(|krate| format!("{}=warn", krate)))
        {
            if let Ok(directive) = directive.parse::<Directive>() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }
}

/// Parses a log level from a string, case-insensitively
///
/// Unknown values fall back to `INFO` with a note on stderr; the subscriber
/// is not up yet when this runs.
///
/// ```
/// use build_tool_detector::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Initializes the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.env_filter();

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        }
    });
}

/// Initializes logging from `BTD_LOG_LEVEL` and `BTD_LOG_JSON`
pub fn init_from_env() {
    let level_str = env::var("BTD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let use_json = env::var("BTD_LOG_JSON")
        .ok()
        .and_then(|v| v.trim().parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level: parse_level(&level_str),
        use_json,
        ..Default::default()
    });
}
