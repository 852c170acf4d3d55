//! In-process fake of the inference engine's HTTP API.
//!
//! Compiled for this crate's tests and, with the `testing` feature, for
//! downstream crates that want to drive a relay end to end.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::upstream::Upstream;

/// What the fake engine answers with.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Names listed by `/api/tags`.
    pub models: Vec<&'static str>,
    /// Raw `/api/tags` body; overrides `models`.
    pub tags_raw: Option<&'static str>,
    pub tags_status: Option<StatusCode>,
    /// Sleep before answering `/api/tags`.
    pub tags_delay: Option<Duration>,
    /// `/api/pull` body, one line per entry.
    pub pull_lines: Vec<&'static str>,
    /// `/api/chat` body, one line per entry.
    pub chat_lines: Vec<&'static str>,
    pub chat_status: Option<StatusCode>,
    /// Sleep before answering `/api/chat` at all.
    pub chat_headers_delay: Option<Duration>,
    /// Sleep before each chat body line.
    pub chat_line_delay: Option<Duration>,
    /// Keep emitting filler lines after `chat_lines` until the client leaves.
    pub chat_endless: bool,
}

#[derive(Debug, Default)]
struct MockState {
    script: Script,
    tags_hits: AtomicUsize,
    pull_hits: AtomicUsize,
    chat_hits: AtomicUsize,
    chat_bodies: Mutex<Vec<Value>>,
    chat_stream_closed: AtomicBool,
}

pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockUpstream {
    pub async fn spawn(script: Script) -> Self {
        let state = Arc::new(MockState {
            script,
            ..Default::default()
        });

        let app = Router::new()
            .route("/api/tags", get(tags))
            .route("/api/pull", post(pull))
            .route("/api/chat", post(chat))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Base URL to point an [`Upstream`] at.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn upstream(&self, model: &str) -> Arc<Upstream> {
        Arc::new(Upstream::new(&self.url(), model).unwrap())
    }

    pub fn tags_hits(&self) -> usize {
        self.state.tags_hits.load(Ordering::SeqCst)
    }

    pub fn pull_hits(&self) -> usize {
        self.state.pull_hits.load(Ordering::SeqCst)
    }

    pub fn chat_hits(&self) -> usize {
        self.state.chat_hits.load(Ordering::SeqCst)
    }

    /// Requests of any kind the engine has seen.
    pub fn total_hits(&self) -> usize {
        self.tags_hits() + self.pull_hits() + self.chat_hits()
    }

    pub fn chat_bodies(&self) -> Vec<Value> {
        self.state.chat_bodies.lock().unwrap().clone()
    }

    /// Wait until the server side of a chat stream has been torn down.
    pub async fn wait_chat_stream_closed(&self, within: Duration) -> bool {
        tokio::time::timeout(within, async {
            while !self.state.chat_stream_closed.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_ok()
    }
}

/// Address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn tags(State(state): State<Arc<MockState>>) -> Response {
    state.tags_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = state.script.tags_delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(status) = state.script.tags_status {
        return (status, "engine unhappy").into_response();
    }
    if let Some(raw) = state.script.tags_raw {
        return raw.into_response();
    }
    let models: Vec<Value> = state
        .script
        .models
        .iter()
        .map(|name| json!({ "name": name, "model": name, "size": 1 }))
        .collect();
    Json(json!({ "models": models })).into_response()
}

async fn pull(State(state): State<Arc<MockState>>, Json(_body): Json<Value>) -> Response {
    state.pull_hits.fetch_add(1, Ordering::SeqCst);
    let mut body = state.script.pull_lines.join("\n");
    body.push('\n');
    body.into_response()
}

/// Flags the chat stream as closed when the body is dropped, however that
/// happens.
struct CloseFlag(Arc<MockState>);

impl Drop for CloseFlag {
    fn drop(&mut self) {
        self.0.chat_stream_closed.store(true, Ordering::SeqCst);
    }
}

async fn chat(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.chat_hits.fetch_add(1, Ordering::SeqCst);
    state.chat_bodies.lock().unwrap().push(body);

    let script = state.script.clone();
    if let Some(delay) = script.chat_headers_delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(status) = script.chat_status {
        return (status, r#"{"error":"model not found"}"#).into_response();
    }

    let flag = CloseFlag(Arc::clone(&state));
    let stream = futures::stream::unfold((0usize, flag), move |(i, flag)| {
        let script = script.clone();
        async move {
            if let Some(delay) = script.chat_line_delay {
                tokio::time::sleep(delay).await;
            }
            let line = if let Some(line) = script.chat_lines.get(i) {
                format!("{line}\n")
            } else if script.chat_endless {
                "{\"message\":{\"role\":\"assistant\",\"content\":\".\"},\"done\":false}\n".to_owned()
            } else {
                return None;
            };
            Some((Ok::<_, Infallible>(Bytes::from(line)), (i + 1, flag)))
        }
    });

    Body::from_stream(stream).into_response()
}
