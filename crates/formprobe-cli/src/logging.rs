//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, LogFormat};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the verbosity flags. Logs go to stderr so that
/// stdout carries only command output.
pub fn init(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.default_filter()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.verbosity.is_verbose());

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_ansi(config.color.should_color()).try_init(),
    };
}
