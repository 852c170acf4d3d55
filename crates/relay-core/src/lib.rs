//! relay-core – the inference relay pipeline.
//!
//! The pieces, leaves first:
//! - [`ModelGuard`] makes sure the configured model is present on the
//!   upstream engine, pulling it when it is missing.
//! - [`build_payload`] turns a prompt plus prior turns into the upstream chat
//!   request.
//! - [`relay`] opens the streamed chat call and hands back a
//!   [`FragmentStream`] fed by a background decode task.
//! - [`TokenBucket`] gates how many relays may begin per unit of time.
//!
//! ```no_run
//! use futures::StreamExt;
//! use relay_core::{build_payload, relay, ModelGuard, Upstream};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let upstream = Arc::new(Upstream::new("http://127.0.0.1:11434", "qwen2:1.5b")?);
//! ModelGuard::new(upstream.clone()).ensure_model().await?;
//!
//! let payload = build_payload("hello", &[], "", upstream.model());
//! let deadline = tokio::time::Instant::now() + Duration::from_secs(120);
//! let mut fragments = relay(&upstream, deadline, &payload).await?;
//! while let Some(text) = fragments.next().await {
//!     print!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

mod admission;
mod error;
mod guard;
mod ndjson;
mod relay;
mod translator;
mod types;
mod upstream;

/// Fake inference engine for tests, here and in downstream crates.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use admission::{TokenBucket, DEFAULT_BURST, DEFAULT_RATE_PER_SEC};
pub use error::{GuardError, RelayError};
pub use guard::ModelGuard;
pub use relay::{relay, FragmentStream, STREAM_ERROR_PREFIX};
pub use translator::build_payload;
pub use types::{ChatRole, ChatTurn, OutboundChatPayload};
pub use upstream::Upstream;
