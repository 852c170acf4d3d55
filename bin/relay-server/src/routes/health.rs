//! `GET /health`: process liveness plus the relay target.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::schemas::health::HealthStatus;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health), components(schemas(HealthStatus)))]
pub struct HealthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// Report which engine and model this relay serves.
///
/// Answers from configuration alone, so a slow or absent engine never makes
/// the relay look dead. Not subject to admission control.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Relay is up", body = HealthStatus))
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: state.upstream.model().to_owned(),
        upstream: state.upstream.base_url().to_owned(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    fn state_for(upstream_url: &str, model: &str) -> Arc<AppState> {
        let config = Config {
            upstream_url: upstream_url.into(),
            model: model.into(),
            ..Config::default()
        };
        Arc::new(AppState::new(config).unwrap())
    }

    #[tokio::test]
    async fn reports_configured_target() {
        // Nothing listens here; any engine call would fail the request.
        let state = state_for("http://127.0.0.1:9/", "llama3:8b");

        let Json(body) = get_health(State(state)).await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.model, "llama3:8b");
        assert_eq!(body.upstream, "http://127.0.0.1:9");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn serializes_flat_json() {
        let Json(body) = get_health(State(state_for("http://engine:11434", "qwen2:1.5b"))).await;

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "model": "qwen2:1.5b",
                "upstream": "http://engine:11434",
            })
        );
    }
}
