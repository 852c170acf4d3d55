//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Health / heartbeat route
//! - `/run-model`, behind admission control
//! - Optional OpenAPI document (disable with `RELAY_ENABLE_DOCS=false`)

pub mod doc;
mod health;
mod run_model;

use axum::middleware::{self};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::middleware::{admission, cors, trace};
use crate::state::AppState;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    // Admission is a route layer so that preflights and health checks never
    // spend a token.
    let relay_router = run_model::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        admission::admission_middleware,
    ));

    let mut app = Router::new().merge(health::router()).merge(relay_router);

    if state.config.enable_docs {
        app = app.merge(doc::router());
    }

    // Top of the builder runs first: every response, preflights included,
    // carries a trace ID.
    app.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(trace::trace_middleware))
            .layer(cors::cors_layer(&state.config)),
    )
    .with_state(state)
}
