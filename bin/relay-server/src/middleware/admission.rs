use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;
use crate::state::AppState;

/// Reject the request with 429 unless the shared bucket has a token.
///
/// Runs before the handler, so a rejected request never reaches the model
/// guard or the engine.
pub async fn admission_middleware(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.limiter.try_acquire() {
        return ServerError::TooManyRequests.into_response();
    }
    next.run(req).await
}
