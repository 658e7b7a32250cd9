//! Structured logging for the export tooling.
//!
//! - stdout is reserved for command payloads (JSON)
//! - stderr receives all log output, human-readable or JSON lines

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel, LogSection};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events are shown at the configured level.
const LOG_TARGETS: [&str; 3] = ["gdpr_core", "gdpr_bundle", "gdpr_common"];

/// Filter for `config`. RUST_LOG directives are used verbatim only when
/// nothing more explicit chose the level.
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_new(filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config.level)))
}

fn filter_directives(config: &LogConfig) -> String {
    match &config.directives {
        Some(directives) => directives.clone(),
        None => default_directives(config.level),
    }
}

fn default_directives(level: LogLevel) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// Returns false if a subscriber was already installed, which happens when
/// tests or an embedding application initialize logging first.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = build_filter(config);

    let installed = match config.format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(std::io::stderr().is_terminal()),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false)
                    .flatten_event(true),
            )
            .try_init(),
    };

    installed.is_ok()
}
