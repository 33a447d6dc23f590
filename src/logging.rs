//! Logging configuration and initialization

use crate::config::Config;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Settings for the tracing subscriber
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or `batchtrace=debug`
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            level: config.log_level.clone(),
        }
    }
}

impl LogConfig {
    /// Show the emitting module for debug and trace output
    pub fn show_target(&self) -> bool {
        let level = self.level.to_ascii_lowercase();
        level.contains("debug") || level.contains("trace")
    }

    /// `RUST_LOG` wins over the configured level
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize tracing for the process
///
/// Log lines go to stderr so stdout stays free for the progress line.
pub fn init_logging(config: &LogConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(config.show_target())
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized at level {}", config.level);
}
