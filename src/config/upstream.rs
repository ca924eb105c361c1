use std::time::Duration;

use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Registry serving package documents and the search API
    #[serde(default = "default_registry_url", with = "serde_url")]
    pub registry_url: Url,
    /// Download-statistics API root (`/point/...` and `/range/...` live below it)
    #[serde(default = "default_downloads_url", with = "serde_url")]
    pub downloads_url: Url,
    /// Timeout for metadata, search and ranged-download calls (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout for the weekly-downloads call made alongside package metadata (seconds)
    #[serde(default = "default_downloads_timeout_secs")]
    pub downloads_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn downloads_timeout(&self) -> Duration {
        Duration::from_secs(self.downloads_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            downloads_url: default_downloads_url(),
            timeout_secs: default_timeout_secs(),
            downloads_timeout_secs: default_downloads_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_registry_url() -> Url {
    Url::parse("https://registry.npmjs.org/").expect("static registry url")
}

fn default_downloads_url() -> Url {
    Url::parse("https://api.npmjs.org/downloads/").expect("static downloads url")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_downloads_timeout_secs() -> u64 {
    8
}

fn default_user_agent() -> String {
    concat!("npm-info/", env!("CARGO_PKG_VERSION")).to_string()
}

mod serde_url {
    use serde::{Deserialize, Deserializer};
    use url::Url;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}
