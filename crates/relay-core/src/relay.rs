//! Streaming relay of `/api/chat` output.
//!
//! [`relay`] sends the chat request and, once the engine answers, spawns a
//! decode task that turns the NDJSON body into text fragments. Fragments are
//! handed to the consumer through a one-slot channel, so a slow consumer
//! stalls decoding instead of letting fragments pile up in memory.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::error::RelayError;
use crate::ndjson::LineReader;
use crate::types::{ChatStreamEvent, OutboundChatPayload};
use crate::upstream::Upstream;

/// Prefix of the in-band fragment that reports a failure after streaming
/// has begun.
pub const STREAM_ERROR_PREFIX: &str = "Streaming error: ";

/// Fragments buffered between the decode task and the consumer.
const HANDOFF_CAPACITY: usize = 1;

/// Open a streamed chat call and return its text fragments.
///
/// Connecting is bounded by `deadline`; so is the rest of the stream. Errors
/// returned here happen before any fragment exists. Later failures arrive as
/// one last fragment starting with [`STREAM_ERROR_PREFIX`].
pub async fn relay(
    upstream: &Upstream,
    deadline: Instant,
    payload: &OutboundChatPayload,
) -> Result<FragmentStream, RelayError> {
    let request = upstream
        .client()
        .post(upstream.endpoint("/api/chat"))
        .json(payload);

    let resp = match tokio::time::timeout_at(deadline, request.send()).await {
        Err(_) => return Err(RelayError::DeadlineExceeded),
        Ok(Err(e)) => return Err(RelayError::ConnectFailed(e)),
        Ok(Ok(resp)) => resp,
    };

    let status = resp.status();
    if !status.is_success() {
        let body = tokio::time::timeout_at(deadline, resp.text())
            .await
            .ok()
            .and_then(Result::ok)
            .unwrap_or_default();
        return Err(RelayError::UpstreamStatus {
            status,
            body: body.trim().to_owned(),
        });
    }

    let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
    let task = tokio::spawn(decode_loop(LineReader::from_response(resp), tx, deadline));

    Ok(FragmentStream {
        rx: ReceiverStream::new(rx),
        task: task.abort_handle(),
    })
}

/// Single-use stream of assistant text fragments.
///
/// Ends when the engine finishes, after an in-band error fragment, or when
/// the deadline passes. Dropping it early aborts the decode task, which drops
/// the upstream response and frees its connection.
#[derive(Debug)]
pub struct FragmentStream {
    rx: ReceiverStream<String>,
    task: AbortHandle,
}

impl Stream for FragmentStream {
    type Item = String;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        Pin::new(&mut self.get_mut().rx).poll_next(cx)
    }
}

impl Drop for FragmentStream {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            debug!("fragment stream dropped before completion; aborting decode task");
            self.task.abort();
        }
    }
}

enum Outcome {
    Finished,
    ConsumerGone,
    Failed(String),
}

async fn decode_loop(mut lines: LineReader, tx: mpsc::Sender<String>, deadline: Instant) {
    let outcome = tokio::select! {
        outcome = pump(&mut lines, &tx) => outcome,
        _ = tokio::time::sleep_until(deadline) => Outcome::Failed("request deadline exceeded".into()),
    };
    // Release the upstream connection before reporting anything.
    drop(lines);

    match outcome {
        Outcome::Finished => debug!("chat stream finished"),
        Outcome::ConsumerGone => debug!("fragment consumer went away"),
        Outcome::Failed(detail) => {
            warn!(error = %detail, "chat stream failed mid-flight");
            // Sender is dropped right after, which ends the consumer's stream.
            let _ = tx.send(format!("{STREAM_ERROR_PREFIX}{detail}")).await;
        }
    }
}

async fn pump(lines: &mut LineReader, tx: &mpsc::Sender<String>) -> Outcome {
    while let Some(line) = lines.next_line().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => return Outcome::Failed(e.to_string()),
        };
        let event: ChatStreamEvent = match serde_json::from_slice(&line) {
            Ok(event) => event,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        if let Some(error) = event.error {
            return Outcome::Failed(error);
        }

        if let Some(content) = event.message.map(|m| m.content).filter(|c| !c.is_empty()) {
            if tx.send(content).await.is_err() {
                return Outcome::ConsumerGone;
            }
        }

        if event.done {
            return Outcome::Finished;
        }
    }
    Outcome::Finished
}
