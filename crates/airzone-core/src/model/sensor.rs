// ── IAQ sensor domain type ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::VentilationMode;
use super::{field_f64, field_i64, field_str};

/// One indoor-air-quality sensor as reported by `iaq {systemID, iaqsensorid}`.
///
/// Sensors share the zone identifier space within a system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    #[serde(rename = "systemID")]
    pub system_id: u32,
    #[serde(rename = "iaqsensorID", alias = "iaqsensorid")]
    pub sensor_id: u32,
    /// Every other field, verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SensorState {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn display_name(&self) -> String {
        field_str(&self.fields, "name")
            .map_or_else(|| format!("IAQ sensor {}", self.sensor_id), str::to_owned)
    }

    /// CO2 in ppm.
    pub fn co2(&self) -> Option<f64> {
        field_f64(&self.fields, "co2_value")
    }

    /// PM2.5 in µg/m³.
    pub fn pm2_5(&self) -> Option<f64> {
        field_f64(&self.fields, "pm2_5_value")
    }

    /// PM10 in µg/m³.
    pub fn pm10(&self) -> Option<f64> {
        field_f64(&self.fields, "pm10_value")
    }

    /// TVOC in ppb.
    pub fn tvoc(&self) -> Option<f64> {
        field_f64(&self.fields, "tvoc_value")
    }

    /// Pressure in hPa.
    pub fn pressure(&self) -> Option<f64> {
        field_f64(&self.fields, "pressure_value")
    }

    pub fn iaq_index(&self) -> Option<i64> {
        field_i64(&self.fields, "iaq_index")
    }

    pub fn iaq_score(&self) -> Option<i64> {
        field_i64(&self.fields, "iaq_score")
    }

    pub fn ventilation_code(&self) -> Option<i64> {
        field_i64(&self.fields, "iaq_mode_vent")
    }

    pub fn ventilation(&self) -> Option<VentilationMode> {
        self.ventilation_code().and_then(VentilationMode::from_code)
    }
}
