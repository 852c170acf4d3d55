//! Wire types shared with the upstream inference engine.
//!
//! Field names follow the engine's JSON contract (`/api/tags`, `/api/pull`,
//! `/api/chat`), so these structs serialize and deserialize directly.

use serde::{Deserialize, Serialize};

/// Author of a [`ChatTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundChatPayload {
    /// Model identifier as the engine knows it (e.g. `"qwen2:1.5b"`).
    pub model: String,
    /// System turn first, then history, then the new user turn.
    pub messages: Vec<ChatTurn>,
    /// Always `true`; the relay only speaks the streaming protocol.
    pub stream: bool,
}

// ── Model registry ───────────────────────────────────────────────────────────

/// Response body of `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub(crate) struct ModelRegistry {
    #[serde(default)]
    pub models: Vec<ModelRegistryEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelRegistryEntry {
    pub name: String,
}

/// Request body for `POST /api/pull`.
#[derive(Debug, Serialize)]
pub(crate) struct PullRequest<'a> {
    pub name: &'a str,
    pub stream: bool,
}

// ── Chat stream ──────────────────────────────────────────────────────────────

/// One NDJSON event of the `/api/chat` response stream.
///
/// Only the fields the relay acts on are modelled; everything else the engine
/// sends (timings, eval counts) is ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatStreamEvent {
    #[serde(default)]
    pub message: Option<ChatStreamMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatStreamMessage {
    #[serde(default)]
    pub content: String,
}
