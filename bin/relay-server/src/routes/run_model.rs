//! The relay endpoint.
//!
//! A request moves through admission (middleware), validation, the model
//! guard and the streaming relay. Anything that goes wrong before the first
//! fragment is a plain-text error status; once streaming has begun the only
//! remaining failure channel is the in-band error fragment produced by
//! relay-core.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::{FromRequest, Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use relay_core::{build_payload, relay, FragmentStream};
use tokio::time::Instant;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::run_model::{ChatTurnDoc, PromptRequest};
use crate::state::AppState;

/// Maximum allowed prompt length in bytes to prevent memory exhaustion.
const MAX_PROMPT_BYTES: usize = 128 * 1024; // 128 KiB

#[derive(OpenApi)]
#[openapi(paths(run_model), components(schemas(PromptRequest, ChatTurnDoc)))]
pub struct RunModelApi;

/// Register the relay route. Admission control is layered on by the caller.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/run-model", post(run_model))
}

/// Relay a prompt to the model and stream the answer (`POST /run-model`).
///
/// The body is `text/plain`, sent chunked with one chunk per generated
/// fragment. There is no end marker; the response ends when generation does.
#[utoipa::path(
    post,
    path = "/run-model",
    tag = "relay",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Generated text, streamed", content_type = "text/plain"),
        (status = 400, description = "Invalid payload or empty prompt"),
        (status = 429, description = "Admission rejected"),
        (status = 500, description = "Model unavailable or engine failure"),
    )
)]
pub async fn run_model(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ServerError> {
    // Reading the body counts against the deadline.
    let deadline = Instant::now() + state.config.request_timeout;

    let read_body = Json::<PromptRequest>::from_request(request, &state);
    let Json(req) = tokio::time::timeout_at(deadline, read_body)
        .await
        .map_err(|_| ServerError::Timeout)?
        .map_err(|e| {
            debug!(error = %e, "unreadable request body");
            ServerError::BadRequest("Invalid request payload".into())
        })?;

    if req.prompt.trim().is_empty() {
        return Err(ServerError::BadRequest("Prompt is required".into()));
    }
    if req.prompt.len() > MAX_PROMPT_BYTES {
        return Err(ServerError::BadRequest(format!(
            "Prompt too large ({} bytes); maximum is {} bytes",
            req.prompt.len(),
            MAX_PROMPT_BYTES,
        )));
    }

    debug!(
        prompt_len = req.prompt.len(),
        history_len = req.history.len(),
        "prompt accepted"
    );

    tokio::time::timeout_at(deadline, state.guard.ensure_model())
        .await
        .map_err(|_| ServerError::Timeout)??;

    let payload = build_payload(
        &req.prompt,
        &req.history,
        &state.config.system_prompt,
        state.upstream.model(),
    );
    let fragments = relay(&state.upstream, deadline, &payload).await?;

    info!(model = %state.upstream.model(), "streaming response");

    let body = Body::from_stream(ClientStream::new(fragments).map(Ok::<_, Infallible>));
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

/// Response body adapter: one `Bytes` chunk per fragment.
///
/// hyper writes and flushes each chunk as it is yielded. If the client goes
/// away hyper drops the body, which drops the inner [`FragmentStream`] and
/// with it the engine call.
struct ClientStream {
    inner: FragmentStream,
    sent: usize,
    finished: bool,
}

impl ClientStream {
    fn new(inner: FragmentStream) -> Self {
        Self {
            inner,
            sent: 0,
            finished: false,
        }
    }
}

impl Stream for ClientStream {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        let this = self.get_mut();
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(text)) => {
                this.sent += 1;
                Poll::Ready(Some(Bytes::from(text)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ClientStream {
    fn drop(&mut self) {
        if self.finished {
            debug!(fragments = self.sent, "response stream completed");
        } else {
            debug!(fragments = self.sent, "client went away mid-stream; relay abandoned");
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
