use serde::Serialize;
use utoipa::ToSchema;

/// Liveness report. Describes configuration only; the engine is not probed.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    pub version: &'static str,
    /// Model every prompt is relayed to.
    pub model: String,
    /// Base URL of the inference engine.
    pub upstream: String,
}
