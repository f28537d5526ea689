// ── Snapshot document ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{SensorState, SystemState, ZoneState};

/// Current on-disk backup format.
pub const SCHEMA_VERSION: u32 = 1;

/// Which webserver a snapshot was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    pub alias: String,
    pub mac: String,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl DeviceIdentity {
    /// Build from the `webserver` and `version` payloads.
    ///
    /// A missing MAC is fatal; a missing alias falls back to the
    /// webserver type, then to `"airzone"`.
    pub fn from_payloads(
        host: &str,
        port: u16,
        webserver: &Value,
        version: &Value,
    ) -> Result<Self, CoreError> {
        let text = |v: &Value, key: &str| {
            v.get(key)
                .and_then(|f| match f {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
        };

        let mac = text(webserver, "mac").ok_or_else(|| CoreError::UnexpectedPayload {
            context: "webserver".into(),
            message: "response carries no MAC address".into(),
        })?;
        let alias = text(webserver, "alias")
            .or_else(|| text(webserver, "ws_type"))
            .unwrap_or_else(|| "airzone".into());

        Ok(Self {
            alias,
            mac,
            host: host.to_owned(),
            port,
            firmware: text(webserver, "ws_firmware"),
            api_version: text(version, "version"),
        })
    }
}

/// Point-in-time copy of every system, zone, and IAQ sensor of one device.
///
/// All constituent reads share a single `created_at`. Entities keep every
/// field the firmware reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    version: u32,
    created_at: DateTime<Utc>,
    device: DeviceIdentity,
    systems: Vec<SystemState>,
    zones: Vec<ZoneState>,
    #[serde(default)]
    sensors: Vec<SensorState>,
}

impl Snapshot {
    pub fn new(
        created_at: DateTime<Utc>,
        device: DeviceIdentity,
        systems: Vec<SystemState>,
        zones: Vec<ZoneState>,
        sensors: Vec<SensorState>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION,
            created_at,
            device,
            systems,
            zones,
            sensors,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    pub fn systems(&self) -> &[SystemState] {
        &self.systems
    }

    pub fn zones(&self) -> &[ZoneState] {
        &self.zones
    }

    pub fn sensors(&self) -> &[SensorState] {
        &self.sensors
    }

    /// `airzone_backup_YYYYMMDD_HHMMSS.json`, from `created_at` in UTC.
    pub fn suggested_name(&self) -> String {
        format!(
            "airzone_backup_{}.json",
            self.created_at.format("%Y%m%d_%H%M%S")
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn identity_prefers_alias_then_type() {
        let ws = json!({ "mac": "AA:BB:CC:00:11:22", "ws_type": "ws_az", "ws_firmware": "3.44" });
        let id = DeviceIdentity::from_payloads("10.0.0.5", 3000, &ws, &json!({ "version": "1.62" }))
            .unwrap();
        assert_eq!(id.alias, "ws_az");
        assert_eq!(id.firmware.as_deref(), Some("3.44"));
        assert_eq!(id.api_version.as_deref(), Some("1.62"));

        let named = json!({ "mac": "AA", "alias": "Casa" });
        let id = DeviceIdentity::from_payloads("h", 3000, &named, &Value::Null).unwrap();
        assert_eq!(id.alias, "Casa");
        assert_eq!(id.api_version, None);
    }

    #[test]
    fn identity_without_mac_is_rejected() {
        let result = DeviceIdentity::from_payloads("h", 3000, &json!({ "alias": "x" }), &Value::Null);
        assert!(matches!(result, Err(CoreError::UnexpectedPayload { .. })));
    }

    #[test]
    fn suggested_name_uses_utc_timestamp() {
        let device = DeviceIdentity::from_payloads("h", 3000, &json!({ "mac": "AA" }), &Value::Null)
            .unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let snapshot = Snapshot::new(at, device, vec![], vec![], vec![]);
        assert_eq!(snapshot.suggested_name(), "airzone_backup_20240309_070501.json");
    }

    #[test]
    fn serializes_with_camel_case_envelope() {
        let device = DeviceIdentity::from_payloads("h", 3000, &json!({ "mac": "AA" }), &Value::Null)
            .unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let value = serde_json::to_value(Snapshot::new(at, device, vec![], vec![], vec![])).unwrap();
        assert_eq!(value["version"], json!(SCHEMA_VERSION));
        assert!(value["createdAt"].is_string());
        assert_eq!(value["device"]["mac"], json!("AA"));
        assert!(value["device"].get("firmware").is_none());
    }
}
