//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

/// Runtime configuration for relay-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Base URL of the inference engine (default: `"http://127.0.0.1:8080"`).
    pub upstream_url: String,

    /// Model every prompt is relayed to (default: `"qwen2:1.5b"`).
    pub model: String,

    /// Fixed system instruction placed first in every conversation.
    /// Empty by default; the system turn is still sent.
    pub system_prompt: String,

    /// Deadline for one `/run-model` request, from the start of the body read
    /// to the last fragment.
    pub request_timeout: Duration,

    /// TCP connect timeout towards the inference engine.
    pub connect_timeout: Duration,

    /// Admission bucket capacity.
    pub rate_burst: u32,

    /// Admission bucket refill rate, in requests per second.
    pub rate_per_sec: f64,

    /// Verify (and pull if needed) the model before accepting traffic.
    pub startup_check: bool,

    /// Comma-separated list of allowed CORS origins. `None` mirrors any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve the OpenAPI document at `/api-docs/openapi.json`.
    pub enable_docs: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".into(),
            upstream_url: "http://127.0.0.1:8080".into(),
            model: "qwen2:1.5b".into(),
            system_prompt: String::new(),
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            rate_burst: relay_core::DEFAULT_BURST,
            rate_per_sec: relay_core::DEFAULT_RATE_PER_SEC,
            startup_check: true,
            cors_allowed_origins: None,
            enable_docs: true,
            log_level: "info".into(),
            log_json: false,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            bind_address: env_or("RELAY_BIND", &d.bind_address),
            upstream_url: env_or("RELAY_UPSTREAM_URL", &d.upstream_url),
            model: env_or("RELAY_MODEL", &d.model),
            system_prompt: env_or("RELAY_SYSTEM_PROMPT", &d.system_prompt),
            request_timeout: Duration::from_secs(parse_env(
                "RELAY_REQUEST_TIMEOUT_SECS",
                d.request_timeout.as_secs(),
            )),
            connect_timeout: Duration::from_secs(parse_env(
                "RELAY_CONNECT_TIMEOUT_SECS",
                d.connect_timeout.as_secs(),
            )),
            rate_burst: parse_env("RELAY_RATE_BURST", d.rate_burst).max(1),
            rate_per_sec: parse_env("RELAY_RATE_PER_SEC", d.rate_per_sec),
            startup_check: flag_env("RELAY_STARTUP_CHECK", d.startup_check),
            cors_allowed_origins: std::env::var("RELAY_CORS_ORIGINS")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            enable_docs: flag_env("RELAY_ENABLE_DOCS", d.enable_docs),
            log_level: env_or("RELAY_LOG", &d.log_level),
            log_json: flag_env("RELAY_LOG_JSON", d.log_json),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn flag_env(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => v == "1" || v.eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.bind_address, "0.0.0.0:3000");
        assert_eq!(cfg.request_timeout, Duration::from_secs(120));
        assert_eq!(cfg.rate_burst, 5);
        assert_eq!(cfg.rate_per_sec, 1.0);
        assert!(cfg.system_prompt.is_empty());
    }

    #[test]
    fn unparsable_number_falls_back() {
        assert_eq!(parse_env("RELAY_TEST_SURELY_UNSET_VAR", 7u32), 7);
    }
}
