use thiserror::Error;

/// Top-level error type for the `airzone-api` crate.
///
/// Covers transport failures, device-side rejections, and payload decoding.
/// `airzone-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Device ──────────────────────────────────────────────────────
    /// Non-2xx status from the webserver, with the raw body.
    #[error("Device returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The webserver answered 2xx but reported errors instead of data
    /// (`{"errors": [...]}` with no `data`/`systems`).
    #[error("Device reported {} error(s)", errors.len())]
    Reported { errors: Vec<serde_json::Value> },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
