// ── Write parameters ──
//
// Typed builders for the PUT bodies. `to_params` only emits fields that
// are set; the selector (`systemID`/`zoneID`) is added by the request.

use serde_json::{Map, Value, json};

use super::enums::{Mode, VentilationMode};
use crate::error::CoreError;

pub const MAX_SLEEP_MINUTES: u32 = 1440;

/// Parameters for `PUT hvac` on one zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneUpdate {
    pub on: Option<bool>,
    pub setpoint: Option<f64>,
    pub mode: Option<Mode>,
    pub speed: Option<u32>,
    /// Sleep timer in minutes, 0 disables.
    pub sleep: Option<u32>,
}

impl ZoneUpdate {
    pub fn is_empty(&self) -> bool {
        self.on.is_none()
            && self.setpoint.is_none()
            && self.mode.is_none()
            && self.speed.is_none()
            && self.sleep.is_none()
    }

    /// Device-independent checks; zone capabilities are checked by
    /// [`ZoneState::check_update`](super::ZoneState::check_update).
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::invalid("parameters", "nothing to change"));
        }
        if let Some(setpoint) = self.setpoint {
            if !setpoint.is_finite() {
                return Err(CoreError::invalid("setpoint", "must be a finite number"));
            }
        }
        if let Some(sleep) = self.sleep {
            if sleep > MAX_SLEEP_MINUTES {
                return Err(CoreError::invalid(
                    "sleep",
                    format!("must be 0-{MAX_SLEEP_MINUTES} minutes, got {sleep}"),
                ));
            }
        }
        Ok(())
    }

    pub fn to_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        if let Some(on) = self.on {
            params.insert("on".into(), json!(u8::from(on)));
        }
        if let Some(setpoint) = self.setpoint {
            params.insert("setpoint".into(), json!(setpoint));
        }
        if let Some(mode) = self.mode {
            params.insert("mode".into(), json!(mode.code()));
        }
        if let Some(speed) = self.speed {
            params.insert("speed".into(), json!(speed));
        }
        if let Some(sleep) = self.sleep {
            params.insert("sleep".into(), json!(sleep));
        }
        params
    }
}

/// Parameters for `PUT iaq` on one sensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorUpdate {
    pub ventilation: Option<VentilationMode>,
}

impl SensorUpdate {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ventilation.is_none() {
            return Err(CoreError::invalid("parameters", "nothing to change"));
        }
        Ok(())
    }

    pub fn to_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        if let Some(mode) = self.ventilation {
            params.insert("iaq_mode_vent".into(), json!(mode.code()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_set_fields_are_sent() {
        let update = ZoneUpdate {
            on: Some(false),
            mode: Some(Mode::Heating),
            ..ZoneUpdate::default()
        };
        let params = update.to_params();
        assert_eq!(Value::Object(params), json!({"on": 0, "mode": 3}));
    }

    #[test]
    fn sleep_is_bounded() {
        let update = ZoneUpdate {
            sleep: Some(1441),
            ..ZoneUpdate::default()
        };
        assert!(update.validate().is_err());
        assert!(ZoneUpdate::default().validate().is_err());
        assert!(
            ZoneUpdate {
                sleep: Some(1440),
                ..ZoneUpdate::default()
            }
            .validate()
            .is_ok()
        );
    }
}
