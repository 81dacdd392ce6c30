use std::sync::Arc;

use vanish_core::SecretStore;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// The secret lifecycle engine.
    pub secrets: Arc<dyn SecretStore>,
}
