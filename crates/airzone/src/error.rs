//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use airzone_config::ConfigError;
use airzone_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const DEVICE: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const INVALID_BACKUP: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the Airzone webserver at {url}")]
    #[diagnostic(
        code(airzone::connection_failed),
        help(
            "Check that the webserver is powered and on the same network.\n\
             The local API listens on port 3000; override with --host / --port\n\
             or set AIRZONE_IP.\n\
             {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(airzone::timeout),
        help("Increase the timeout with --timeout or check the webserver's Wi-Fi signal.")
    )]
    Timeout { seconds: u64 },

    // ── Device ───────────────────────────────────────────────────────
    #[error("The webserver rejected the request: {message}")]
    #[diagnostic(code(airzone::device))]
    Device {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Unexpected response from the webserver: {message}")]
    #[diagnostic(
        code(airzone::unexpected_payload),
        help("The firmware may be newer than this tool understands. Try -vv for details.")
    )]
    UnexpectedPayload { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(airzone::not_found),
        help("Run: airzone {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Backup file already exists: {}", path.display())]
    #[diagnostic(
        code(airzone::conflict),
        help("Backups are never overwritten. Wait a second and try again, or move the file.")
    )]
    AlreadyExists { path: PathBuf },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(airzone::validation))]
    Validation { field: String, reason: String },

    #[error("Backup is invalid ({count} problem(s))")]
    #[diagnostic(
        code(airzone::invalid_backup),
        help("Run: airzone backup validate <file> to see every problem")
    )]
    BackupInvalid { count: usize },

    #[error("Backup aborted while fetching {entity}: {reason}")]
    #[diagnostic(
        code(airzone::partial_backup),
        help("No file was written. Backups are all-or-nothing; retry once the device responds.")
    )]
    PartialBackup { entity: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(airzone::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: airzone config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(airzone::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(airzone::json))]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    #[diagnostic(code(airzone::internal))]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Device { .. } | Self::UnexpectedPayload { .. } => exit_code::DEVICE,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::AlreadyExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::BackupInvalid { .. } => exit_code::INVALID_BACKUP,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Device {
                code,
                message,
                explanation,
            } => CliError::Device {
                message: code.map_or_else(|| message.clone(), |c| format!("{c} ({message})")),
                help: explanation.map(|e| format!("{e}\nRun: airzone errors for remedies")),
            },

            CoreError::UnexpectedPayload { context, message } => CliError::UnexpectedPayload {
                message: format!("{context}: {message}"),
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => {
                let list_command = match entity_type.as_str() {
                    "IAQ sensor" => "iaq list",
                    "backup" => "backup list",
                    _ => "list",
                };
                CliError::NotFound {
                    resource_type: entity_type,
                    identifier,
                    list_command: list_command.into(),
                }
            }

            CoreError::Validation { report } => CliError::BackupInvalid {
                count: report.errors.len(),
            },

            CoreError::PartialBackup { entity, source } => CliError::PartialBackup {
                entity,
                reason: source.to_string(),
            },

            CoreError::AlreadyExists { path } => CliError::AlreadyExists { path },

            CoreError::InvalidParameter { field, reason } => CliError::Validation { field, reason },

            CoreError::Io { path, source } => CliError::Io(std::io::Error::new(
                source.kind(),
                format!("{}: {source}", path.display()),
            )),

            CoreError::Cache(e) => CliError::Internal(e.to_string()),

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
            ConfigError::Serialization(e) => CliError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_keeps_code_and_explanation() {
        let err = CliError::from(CoreError::Device {
            code: Some("Error 9".into()),
            message: "HTTP 500".into(),
            explanation: Some("Gateway-System communication error.".into()),
        });
        assert_eq!(err.exit_code(), exit_code::DEVICE);
        match err {
            CliError::Device { message, help } => {
                assert_eq!(message, "Error 9 (HTTP 500)");
                assert!(help.is_some_and(|h| h.starts_with("Gateway-System")));
            }
            other => panic!("expected Device, got {other:?}"),
        }
    }

    #[test]
    fn missing_backup_points_to_backup_list() {
        let err = CliError::from(CoreError::NotFound {
            entity_type: "backup".into(),
            identifier: "x.json".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(err, CliError::NotFound { ref list_command, .. } if list_command == "backup list"));
    }

    #[test]
    fn bad_parameters_are_usage_errors() {
        let err = CliError::from(CoreError::InvalidParameter {
            field: "setpoint".into(),
            reason: "out of range".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
