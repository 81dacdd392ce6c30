use std::time::Duration;

use serde::{Deserialize, Serialize};
use vanish_core::StoreConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base used when building retrieval URLs (e.g. https://vanish.example).
    /// Without it the request's Host header is used.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Largest accepted secret payload in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// TTL applied to secrets stored without one. Unset means such secrets
    /// live until redeemed.
    #[serde(default)]
    pub default_ttl_secs: Option<u64>,
    /// Ceiling clamped onto every secret's TTL.
    #[serde(default)]
    pub max_ttl_secs: Option<u64>,
    /// How often the expiry sweeper runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking.
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024
}

fn default_sweep_interval_secs() -> u64 {
    30
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_payload_bytes: self.max_payload_bytes,
            default_ttl: self.default_ttl_secs.map(Duration::from_secs),
            max_ttl: self.max_ttl_secs.map(Duration::from_secs),
            ..StoreConfig::default()
        }
    }
}
