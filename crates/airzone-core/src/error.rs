// ── Core error types ──
//
// User-facing errors from airzone-core. Consumers never see reqwest errors
// or raw HTTP bodies directly. The `From<airzone_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants and
// runs device errors through the error-code catalog.

use std::path::PathBuf;

use thiserror::Error;

use crate::backup::ValidationReport;
use crate::error_codes;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Airzone webserver at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Airzone webserver timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Device errors ────────────────────────────────────────────────
    /// The webserver rejected the request or reported an error code.
    #[error("Device error{}: {message}", code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Device {
        code: Option<String>,
        message: String,
        /// Human-readable explanation from the catalog, if the code is known.
        explanation: Option<String>,
    },

    #[error("Unexpected {context} payload: {message}")]
    UnexpectedPayload { context: String, message: String },

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Cache errors (absorbed by `Client`) ──────────────────────────
    #[error(transparent)]
    Cache(#[from] CacheError),

    // ── Backup errors ────────────────────────────────────────────────
    #[error("Snapshot failed validation with {} error(s)", report.errors.len())]
    Validation { report: ValidationReport },

    #[error("Backup aborted while fetching {entity}")]
    PartialBackup {
        entity: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Backup already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    // ── IO / internal ────────────────────────────────────────────────
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn partial(entity: impl Into<String>, source: CoreError) -> Self {
        Self::PartialBackup {
            entity: entity.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a device error from whatever the webserver reported.
    fn from_device(message: String, errors: &serde_json::Value) -> Self {
        let code = error_codes::extract_codes(errors).into_iter().next();
        let explanation = code
            .as_deref()
            .map(error_codes::lookup)
            .filter(|info| info.known)
            .map(|info| info.description.to_owned());
        Self::Device {
            code,
            message,
            explanation,
        }
    }
}

/// Errors from the on-disk response cache.
///
/// `Client` never propagates these: a failing cache degrades to live
/// fetches. They surface only from direct store operations (`cache clear`).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock cache at {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cache entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<airzone_api::Error> for CoreError {
    fn from(err: airzone_api::Error) -> Self {
        match err {
            airzone_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            airzone_api::Error::InvalidUrl(e) => CoreError::InvalidParameter {
                field: "host".into(),
                reason: e.to_string(),
            },
            airzone_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            airzone_api::Error::Status { status, body } => {
                let parsed = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("errors").cloned())
                    .unwrap_or(serde_json::Value::Null);
                let message = if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {}", body.trim())
                };
                CoreError::from_device(message, &parsed)
            }
            airzone_api::Error::Reported { errors } => {
                let value = serde_json::Value::Array(errors);
                CoreError::from_device(value.to_string(), &value)
            }
            airzone_api::Error::Deserialization { message, body: _ } => {
                CoreError::UnexpectedPayload {
                    context: "webserver".into(),
                    message,
                }
            }
        }
    }
}
