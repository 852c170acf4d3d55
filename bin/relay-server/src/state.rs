//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use relay_core::{ModelGuard, TokenBucket, Upstream};

use crate::config::Config;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Inference engine endpoint and its HTTP client.
    pub upstream: Arc<Upstream>,
    /// Model availability check, run before every relay.
    pub guard: ModelGuard,
    /// Process-wide admission bucket.
    pub limiter: Arc<TokenBucket>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let upstream = Arc::new(Upstream::with_connect_timeout(
            &config.upstream_url,
            &config.model,
            config.connect_timeout,
        )?);
        let limiter = Arc::new(TokenBucket::new(config.rate_burst, config.rate_per_sec));

        Ok(Self {
            guard: ModelGuard::new(Arc::clone(&upstream)),
            config: Arc::new(config),
            upstream,
            limiter,
        })
    }
}
