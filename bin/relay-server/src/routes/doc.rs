use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::routes::{health, run_model};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(info(
    title = "relay-server",
    description = "Streams chat completions from a local inference engine",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(run_model::RunModelApi::openapi());
    root
}

/// Serve the OpenAPI document at `/api-docs/openapi.json`.
pub fn router() -> Router<Arc<AppState>> {
    let doc = get_docs();
    Router::new().route("/api-docs/openapi.json", get(move || async move { Json(doc) }))
}
