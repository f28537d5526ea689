// ── Backup engine ──
//
// Snapshots are captured from a live device by `BackupEngine`, stored as
// versioned pretty JSON by `BackupStore`, and only ever compared against
// live state. Restore is advisory: nothing here writes to the device.

mod diff;
mod engine;
mod snapshot;
mod storage;
mod validate;

pub use diff::{DiffResult, DiffScope, EntityDiff, EntityRef, FieldChange, diff};
pub use engine::{BackupEngine, BackupOptions};
pub use snapshot::{DeviceIdentity, SCHEMA_VERSION, Snapshot};
pub use storage::{BackupStore, BackupSummary};
pub use validate::{ValidationIssue, ValidationReport, validate_bytes, validate_snapshot, validate_value};

use crate::error::CoreError;

/// Encode a snapshot as pretty JSON.
pub fn serialize(snapshot: &Snapshot) -> Result<Vec<u8>, CoreError> {
    let mut bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| CoreError::Internal(format!("failed to encode snapshot: {e}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode and validate a backup file.
///
/// Any defect, including an unknown `version`, yields
/// `CoreError::Validation` carrying the full report.
pub fn deserialize(bytes: &[u8]) -> Result<Snapshot, CoreError> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(_) => {
            return Err(CoreError::Validation {
                report: validate_bytes(bytes),
            });
        }
    };

    let report = validate_value(&value);
    if !report.valid {
        return Err(CoreError::Validation { report });
    }

    serde_json::from_value(value).map_err(|e| CoreError::Validation {
        report: ValidationReport::from_issues(vec![ValidationIssue {
            path: "$".into(),
            reason: e.to_string(),
        }]),
    })
}
