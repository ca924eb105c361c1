//! `[logging]` table, read once by `init_tracing` at startup.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Environment variable whose directives take precedence over `logging.level`
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info` or `npm_info=debug,rama=warn`.
    /// Only used when `RUST_LOG` is unset.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// One flattened JSON object per event instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    /// Filter for the subscriber: `RUST_LOG` when it is set, `level` otherwise.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match std::env::var(LOG_FILTER_ENV) {
            Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
                .with_context(|| format!("invalid {LOG_FILTER_ENV} {directives:?}")),
            _ => self.level_filter(),
        }
    }

    /// Parses `level` on its own; `validate` uses this to reject bad directives early.
    pub fn level_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(&self.level)
            .with_context(|| format!("invalid logging.level {:?}", self.level))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LoggingConfig::default_level(),
            json: false,
        }
    }
}
