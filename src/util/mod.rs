//! Process-level helpers shared by the binary and the server

pub mod logging;

pub use logging::{init_from_env, init_logging, parse_level, LoggingConfig};
