// ── Zone domain type ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::{AirQuality, Mode, Units};
use super::update::ZoneUpdate;
use super::{field_codes, field_f64, field_i64, field_str};
use crate::error::CoreError;

const DEFAULT_MIN_TEMP: f64 = 15.0;
const DEFAULT_MAX_TEMP: f64 = 30.0;

/// One climate zone as reported by `hvac {systemID, zoneID}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    #[serde(rename = "systemID")]
    pub system_id: u32,
    #[serde(rename = "zoneID")]
    pub zone_id: u32,
    /// Every other field, verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ZoneState {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn name(&self) -> Option<&str> {
        field_str(&self.fields, "name")
    }

    pub fn display_name(&self) -> String {
        self.name()
            .map_or_else(|| format!("Zone {}", self.zone_id), str::to_owned)
    }

    pub fn is_on(&self) -> bool {
        field_i64(&self.fields, "on") == Some(1)
    }

    pub fn setpoint(&self) -> Option<f64> {
        field_f64(&self.fields, "setpoint")
    }

    pub fn room_temp(&self) -> Option<f64> {
        field_f64(&self.fields, "roomTemp")
    }

    pub fn humidity(&self) -> Option<i64> {
        field_i64(&self.fields, "humidity")
    }

    pub fn mode_code(&self) -> Option<i64> {
        field_i64(&self.fields, "mode")
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode_code().and_then(Mode::from_code)
    }

    pub fn mode_name(&self) -> String {
        match (self.mode(), self.mode_code()) {
            (Some(mode), _) => mode.to_string(),
            (None, Some(code)) => format!("Unknown ({code})"),
            (None, None) => "-".into(),
        }
    }

    /// Modes this zone accepts (`modes`); empty when the firmware doesn't say.
    pub fn available_modes(&self) -> Vec<i64> {
        int_list(self.fields.get("modes"))
    }

    pub fn speed(&self) -> Option<i64> {
        field_i64(&self.fields, "speed")
    }

    /// Discrete fan speeds (`speed_values`); empty when not reported.
    pub fn available_speeds(&self) -> Vec<i64> {
        int_list(self.fields.get("speed_values"))
    }

    pub fn sleep(&self) -> Option<i64> {
        field_i64(&self.fields, "sleep")
    }

    pub fn units(&self) -> Units {
        Units::from_code(field_i64(&self.fields, "units"))
    }

    pub fn min_temp(&self) -> f64 {
        field_f64(&self.fields, "minTemp").unwrap_or(DEFAULT_MIN_TEMP)
    }

    pub fn max_temp(&self) -> f64 {
        field_f64(&self.fields, "maxTemp").unwrap_or(DEFAULT_MAX_TEMP)
    }

    pub fn air_quality(&self) -> Option<AirQuality> {
        field_i64(&self.fields, "aq_quality").and_then(AirQuality::from_code)
    }

    pub fn error_codes(&self) -> Vec<String> {
        field_codes(&self.fields)
    }

    pub fn has_errors(&self) -> bool {
        !self.error_codes().is_empty()
    }

    /// Check an update against this zone's advertised capabilities.
    pub fn check_update(&self, update: &ZoneUpdate) -> Result<(), CoreError> {
        if let Some(setpoint) = update.setpoint {
            let (min, max) = (self.min_temp(), self.max_temp());
            if !(min..=max).contains(&setpoint) {
                return Err(CoreError::invalid(
                    "setpoint",
                    format!("{setpoint} is outside this zone's range {min}-{max}"),
                ));
            }
        }
        if let Some(mode) = update.mode {
            let modes = self.available_modes();
            if !modes.is_empty() && !modes.contains(&i64::from(mode.code())) {
                return Err(CoreError::invalid(
                    "mode",
                    format!("{mode} is not supported by this zone (supported: {modes:?})"),
                ));
            }
        }
        if let Some(speed) = update.speed {
            let speeds = self.available_speeds();
            let max = field_i64(&self.fields, "speeds");
            let speed = i64::from(speed);
            let ok = if speeds.is_empty() {
                max.is_none_or(|max| (0..=max).contains(&speed))
            } else {
                speeds.contains(&speed)
            };
            if !ok {
                return Err(CoreError::invalid(
                    "fan speed",
                    format!("{speed} is not supported by this zone"),
                ));
            }
        }
        Ok(())
    }
}

fn int_list(value: Option<&Value>) -> Vec<i64> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn zone(body: Value) -> ZoneState {
        serde_json::from_value(body).unwrap_or_else(|e| panic!("bad fixture: {e}"))
    }

    #[test]
    fn preserves_unknown_fields() {
        let z = zone(json!({
            "systemID": 1, "zoneID": 2, "name": "Salon", "on": 1,
            "setpoint": 22.5, "mode": 2, "vendor_flag": [1, 2]
        }));
        assert_eq!(z.display_name(), "Salon");
        assert!(z.is_on());
        assert_eq!(z.mode(), Some(Mode::Cooling));
        assert_eq!(z.get("vendor_flag"), Some(&json!([1, 2])));

        let back = serde_json::to_value(&z).unwrap_or_default();
        assert_eq!(back["systemID"], 1);
        assert_eq!(back["vendor_flag"], json!([1, 2]));
    }

    #[test]
    fn check_update_respects_capabilities() {
        let z = zone(json!({
            "systemID": 1, "zoneID": 1, "minTemp": 18, "maxTemp": 28,
            "modes": [1, 2, 3], "speed_values": [0, 2, 4]
        }));

        let ok = ZoneUpdate {
            setpoint: Some(21.0),
            mode: Some(Mode::Heating),
            speed: Some(2),
            ..ZoneUpdate::default()
        };
        assert!(z.check_update(&ok).is_ok());

        let hot = ZoneUpdate {
            setpoint: Some(29.0),
            ..ZoneUpdate::default()
        };
        assert!(matches!(
            z.check_update(&hot),
            Err(CoreError::InvalidParameter { ref field, .. }) if field == "setpoint"
        ));

        let dry = ZoneUpdate {
            mode: Some(Mode::Dehumidify),
            ..ZoneUpdate::default()
        };
        assert!(z.check_update(&dry).is_err());

        let odd_speed = ZoneUpdate {
            speed: Some(3),
            ..ZoneUpdate::default()
        };
        assert!(z.check_update(&odd_speed).is_err());
    }
}
