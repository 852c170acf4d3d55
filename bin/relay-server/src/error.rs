//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`]. Successful responses are plain text, so
//! errors are plain text too: a human-readable line starting with
//! [`ERROR_PREFIX`] that lets clients tell failures apart from model output.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay_core::{GuardError, RelayError};
use thiserror::Error;
use tracing::{error, warn};

/// Leading marker of every error body.
pub const ERROR_PREFIX: &str = "Bad vibes: ";

/// All errors that can occur in the relay-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// The admission bucket is empty.
    #[error("Too many requests")]
    TooManyRequests,

    /// The model could not be confirmed or pulled.
    #[error("Failed to ensure model availability: {0}")]
    ModelUnavailable(#[from] GuardError),

    /// The chat call failed before the first fragment.
    #[error("Failed to run model: {0}")]
    Relay(#[from] RelayError),

    /// The request deadline passed while waiting on the engine.
    #[error("Request timed out")]
    Timeout,
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ServerError::ModelUnavailable(_) | ServerError::Relay(_) | ServerError::Timeout => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, %status, "request rejected");
        }
        (status, format!("{ERROR_PREFIX}{self}")).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(ServerError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::TooManyRequests.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ServerError::ModelUnavailable(GuardError::PullIncomplete).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::Relay(RelayError::DeadlineExceeded).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ServerError::Timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn messages_carry_prefix_and_cause() {
        let resp = ServerError::ModelUnavailable(GuardError::PullIncomplete).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let text = format!(
            "{ERROR_PREFIX}{}",
            ServerError::ModelUnavailable(GuardError::PullIncomplete)
        );
        assert_eq!(
            text,
            "Bad vibes: Failed to ensure model availability: model pull did not complete successfully"
        );
    }
}
