//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SESSION_FILE: &str = ".svgpad-session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Websocket endpoint of the document service.
    pub ws_url: String,
    /// How long a request waits for its reply.
    pub request_timeout: Duration,
    /// Where the session token is persisted between runs.
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_owned(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

impl ClientConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `SVGPAD_WS_URL`: default `ws://localhost:8080`
    /// - `SVGPAD_REQUEST_TIMEOUT_MS`: default 10000
    /// - `SVGPAD_SESSION_FILE`: default `.svgpad-session.json`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Unset, blank or unparsable values
    /// fall back to the defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let ws_url = get("SVGPAD_WS_URL").unwrap_or_else(|| DEFAULT_WS_URL.to_owned());
        let timeout_ms = get("SVGPAD_REQUEST_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        let session_file = get("SVGPAD_SESSION_FILE").map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        Self { ws_url, request_timeout: Duration::from_millis(timeout_ms), session_file }
    }
}
