use thiserror::Error;

/// Errors from [`crate::ModelGuard::ensure_model`].
///
/// Every variant is terminal for the request that triggered the check; the
/// guard never retries.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The engine could not be reached or answered with a non-2xx status.
    #[error("could not reach inference engine: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// `/api/tags` answered but the body was not a model list.
    #[error("could not decode models response: {0}")]
    MalformedRegistry(#[source] reqwest::Error),

    /// The pull stream produced something that is not JSON, or broke off
    /// mid-transfer.
    #[error("could not decode pull model response: {0}")]
    PullFailed(String),

    /// A pull event decoded fine but had no `status` field.
    #[error("unexpected response structure: {0}")]
    UnexpectedResponseShape(serde_json::Value),

    /// The pull stream ended without ever reporting `"success"`.
    #[error("model pull did not complete successfully")]
    PullIncomplete,
}

/// Errors from [`crate::relay`] raised before the first fragment.
///
/// Failures after the stream has started are delivered in-band instead.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Building or sending the chat request failed at the transport level.
    #[error("could not post chat request: {0}")]
    ConnectFailed(#[source] reqwest::Error),

    /// The engine answered the chat request with a non-2xx status.
    #[error("inference engine returned {status}: {body}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The request deadline passed before the engine answered.
    #[error("request deadline exceeded before the inference engine responded")]
    DeadlineExceeded,
}
