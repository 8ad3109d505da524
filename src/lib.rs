pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod services;

pub use db::DbPool;

use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::crypto::TokenKeys;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub tokens: TokenKeys,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let tokens = TokenKeys::new(&config.auth.token_secret, config.auth.token_ttl_hours);
        Self {
            config,
            db,
            tokens,
            metrics_handle: None,
        }
    }

    /// Set the Prometheus metrics handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
