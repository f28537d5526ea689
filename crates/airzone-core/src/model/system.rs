// ── System domain type ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{field_codes, field_i64, field_str};

/// One HVAC system as reported by `hvac {systemID}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    #[serde(rename = "systemID")]
    pub system_id: u32,
    /// Every other field, verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SystemState {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn name(&self) -> String {
        field_str(&self.fields, "name")
            .map_or_else(|| format!("System {}", self.system_id), str::to_owned)
    }

    pub fn manufacturer(&self) -> Option<&str> {
        field_str(&self.fields, "manufacturer")
    }

    pub fn firmware(&self) -> Option<&str> {
        field_str(&self.fields, "system_firmware")
    }

    pub fn system_type(&self) -> Option<i64> {
        field_i64(&self.fields, "system_type")
    }

    pub fn error_codes(&self) -> Vec<String> {
        field_codes(&self.fields)
    }

    pub fn has_errors(&self) -> bool {
        !self.error_codes().is_empty()
    }
}
