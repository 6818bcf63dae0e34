//! Logging infrastructure using `tracing` and `tracing-subscriber`.
//!
//! # Log Levels
//!
//! - `error`: failed uploads, fatal errors
//! - `warn`: recoverable oddities (unknown dictionary records, odd headers)
//! - `info`: upload and transform progress, row/column counts
//! - `debug`: per-operation detail

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter for the workspace crates.
    pub level: Level,
    /// Whether to use ANSI colors in output.
    pub with_ansi: bool,
    /// Whether to include target (module path) in log output.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_ansi: io::stderr().is_terminal(),
            with_target: false,
        }
    }
}

/// Initialize the global tracing subscriber with the given configuration.
///
/// This should be called once at application startup.
///
/// # Panics
///
/// Panics if called more than once.
pub fn init_logging(config: &LogConfig) {
    let filter = build_env_filter(config.level);
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target)
        .without_time();

    tracing_subscriber::registry().with(filter).with(layer).init();
}

/// Build an `EnvFilter` from the given level, respecting `RUST_LOG` env var.
fn build_env_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Workspace crates at the configured level, external crates at warn
        EnvFilter::new(format!(
            "warn,svy_server={level},svy_ingest={level},svy_report={level},\
             svy_sav={level},svy_transform={level}",
            level = level_str
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.with_target);
    }
}
