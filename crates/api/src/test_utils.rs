//! Shared test utilities for API handler tests.
//!
//! Handler tests run against a real in-memory store; it is fast and keeps
//! the tests honest about the exactly-once semantics.

use std::sync::Arc;

use vanish_core::MemoryStore;

use crate::config::Config;
use crate::state::AppState;

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        public_base_url: None,
        max_payload_bytes: 1024 * 1024,
        default_ttl_secs: None,
        max_ttl_secs: None,
        sweep_interval_secs: 30,
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// State with default configuration.
pub fn test_state() -> AppState {
    test_state_with_config(|_| {})
}

/// State with the test configuration adjusted by `customize`; the store is
/// built from the adjusted config.
pub fn test_state_with_config(customize: impl FnOnce(&mut Config)) -> AppState {
    let mut config = test_config();
    customize(&mut config);
    let secrets = Arc::new(MemoryStore::new(config.store_config()));
    AppState { config, secrets }
}
