use std::time::Duration;

use reqwest::Client;

/// Connection details for the inference engine.
///
/// Holds the one [`Client`] used for every upstream call so the transport can
/// reuse connections to the engine.
#[derive(Debug, Clone)]
pub struct Upstream {
    base_url: String,
    model: String,
    client: Client,
}

impl Upstream {
    /// Build an upstream with default transport settings.
    pub fn new(base_url: &str, model: &str) -> Result<Self, reqwest::Error> {
        Self::with_connect_timeout(base_url, model, Duration::from_secs(10))
    }

    pub fn with_connect_timeout(
        base_url: &str,
        model: &str,
        connect_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("relay/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Absolute URL of an engine endpoint, e.g. `endpoint("/api/tags")`.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
