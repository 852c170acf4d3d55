//! Model availability guard.
//!
//! Before a prompt is relayed the configured model must exist on the engine.
//! The registry is asked on every call (nothing is cached), so a request never
//! streams against a model that was absent at check time.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::GuardError;
use crate::ndjson::LineReader;
use crate::types::{ModelRegistry, PullRequest};
use crate::upstream::Upstream;

/// Terminal `status` of a successful pull.
const PULL_SUCCESS: &str = "success";

/// Ensures the upstream engine has the configured model loaded.
///
/// Stateless apart from the shared [`Upstream`], so one guard can serve any
/// number of concurrent requests.
#[derive(Debug, Clone)]
pub struct ModelGuard {
    upstream: Arc<Upstream>,
}

impl ModelGuard {
    pub fn new(upstream: Arc<Upstream>) -> Self {
        Self { upstream }
    }

    /// Succeed immediately if the model is listed, otherwise pull it and wait
    /// for the engine to report success.
    pub async fn ensure_model(&self) -> Result<(), GuardError> {
        let model = self.upstream.model();
        debug!(%model, "checking model registry");

        if self.is_listed().await? {
            debug!(%model, "model already present");
            return Ok(());
        }

        info!(%model, "model not present on engine; pulling");
        self.pull().await
    }

    async fn is_listed(&self) -> Result<bool, GuardError> {
        let resp = self
            .upstream
            .client()
            .get(self.upstream.endpoint("/api/tags"))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(GuardError::UpstreamUnreachable)?;

        let registry: ModelRegistry = resp.json().await.map_err(GuardError::MalformedRegistry)?;

        let wanted = self.upstream.model();
        Ok(registry.models.iter().any(|m| same_model(&m.name, wanted)))
    }

    async fn pull(&self) -> Result<(), GuardError> {
        let model = self.upstream.model();
        let resp = self
            .upstream
            .client()
            .post(self.upstream.endpoint("/api/pull"))
            .json(&PullRequest {
                name: model,
                stream: true,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(GuardError::UpstreamUnreachable)?;

        let mut lines = LineReader::from_response(resp);
        while let Some(line) = lines.next_line().await {
            let line = line.map_err(|e| GuardError::PullFailed(e.to_string()))?;
            let event: Value =
                serde_json::from_slice(&line).map_err(|e| GuardError::PullFailed(e.to_string()))?;

            let Some(status) = event.get("status").and_then(Value::as_str) else {
                return Err(GuardError::UnexpectedResponseShape(event));
            };

            debug!(
                %model,
                status,
                completed = event.get("completed").and_then(serde_json::Value::as_u64),
                total = event.get("total").and_then(serde_json::Value::as_u64),
                "pull progress"
            );

            if status == PULL_SUCCESS {
                info!(%model, "model pull succeeded");
                return Ok(());
            }
        }

        Err(GuardError::PullIncomplete)
    }
}

/// The engine lists untagged models as `<name>:latest`.
fn same_model(listed: &str, wanted: &str) -> bool {
    listed == wanted || (!wanted.contains(':') && listed.strip_suffix(":latest") == Some(wanted))
}
