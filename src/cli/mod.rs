pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, DetectArgs, ServeArgs};
pub use handlers::{handle_detect, handle_serve};
pub use output::{OutputFormatter, Rendered};
