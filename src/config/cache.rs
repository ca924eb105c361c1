use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// How long an aggregated response is served from memory (seconds)
    #[serde(default = "CacheConfig::default_ttl_secs")]
    pub ttl_secs: u64,
    /// Cron schedule for purging expired entries (e.g., "0 */5 * * * *")
    /// Empty string leaves expiry purely read-side
    #[serde(default)]
    pub sweep_schedule: String,
}

impl CacheConfig {
    fn default_ttl_secs() -> u64 {
        60
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Self::default_ttl_secs(),
            sweep_schedule: String::new(),
        }
    }
}
