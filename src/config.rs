use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use thiserror::Error;

// Re-export all submodules
pub mod cache;
pub mod logging;
pub mod server;
pub mod upstream;


pub use cache::CacheConfig;
pub use logging::LoggingConfig;
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;

/// Environment variable overriding `cache.ttl_secs`
pub const CACHE_TTL_ENV: &str = "CACHE_TTL";

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer number of seconds, got {value:?}")]
    InvalidTtl { var: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let candidate = path.unwrap_or_else(|| PathBuf::from("npm-info.toml"));
        let mut config = if candidate.exists() {
            let raw = fs::read_to_string(&candidate)
                .with_context(|| format!("failed to read config {}", candidate.display()))?;
            toml::from_str::<Config>(&raw)
                .with_context(|| format!("invalid config {}", candidate.display()))?
        } else {
            if let Some(path) = candidate.to_str() {
                tracing::warn!("configuration file {path} not found, using defaults");
            } else {
                tracing::warn!("configuration file not found, using defaults");
            }
            Config::default()
        };

        config
            .apply_env(|name| std::env::var(name).ok())
            .context("reading environment overrides")?;
        Ok(config)
    }

    /// Applies environment overrides on top of file values.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(CACHE_TTL_ENV) {
            self.cache.ttl_secs = parse_ttl(&raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for url in [&self.upstream.registry_url, &self.upstream.downloads_url] {
            if url.scheme() != "https" && url.scheme() != "http" {
                bail!("unsupported upstream scheme {url}");
            }
        }
        if self.upstream.timeout_secs == 0 || self.upstream.downloads_timeout_secs == 0 {
            bail!("upstream timeouts must be at least one second");
        }
        if self.server.workers == 0 {
            bail!("server.workers must be at least 1");
        }
        self.logging.level_filter()?;
        Ok(())
    }
}

fn parse_ttl(raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidTtl {
            var: CACHE_TTL_ENV,
            value: raw.to_string(),
        })
}
