// ── Domain model ──
//
// Thin typed views over webserver payloads. Each state type pins the
// identifiers and keeps every other field verbatim in `fields`, so a
// snapshot round-trips whatever the firmware reports.

mod enums;
mod sensor;
mod system;
mod update;
mod zone;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::CoreError;

pub use enums::{AirQuality, Mode, Units, VentilationMode};
pub use sensor::SensorState;
pub use system::SystemState;
pub use update::{MAX_SLEEP_MINUTES, SensorUpdate, ZoneUpdate};
pub use zone::ZoneState;

// ── Payload extraction ──────────────────────────────────────────────

/// Flatten the webserver's response envelopes into entity objects.
///
/// Handles `{"data": [..]}`, `{"data": {..}}`, `{"systems": [..]}` and the
/// all-zones shape `{"systems": [{"data": [..]}, ..]}`.
pub(crate) fn entity_objects(body: &Value) -> Vec<Map<String, Value>> {
    let mut out = Vec::new();
    if let Some(data) = body.get("data") {
        push_objects(data, &mut out);
    }
    if let Some(Value::Array(systems)) = body.get("systems") {
        for system in systems {
            match system.get("data") {
                Some(data) => push_objects(data, &mut out),
                None => push_objects(system, &mut out),
            }
        }
    }
    out
}

fn push_objects(value: &Value, out: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Array(items) => out.extend(items.iter().filter_map(|v| v.as_object().cloned())),
        Value::Object(map) => out.push(map.clone()),
        _ => {}
    }
}

/// Parse every entity in `body` as `T`, filling in identifiers the
/// firmware omits (e.g. `systemID` on per-system listings).
pub(crate) fn parse_entities<T: DeserializeOwned>(
    body: &Value,
    context: &str,
    defaults: &[(&str, u32)],
) -> Result<Vec<T>, CoreError> {
    entity_objects(body)
        .into_iter()
        .map(|mut obj| {
            for (key, id) in defaults {
                obj.entry(*key).or_insert_with(|| Value::from(*id));
            }
            serde_json::from_value(Value::Object(obj)).map_err(|e| {
                CoreError::UnexpectedPayload {
                    context: context.into(),
                    message: e.to_string(),
                }
            })
        })
        .collect()
}

// ── Field accessors shared by the state types ───────────────────────

pub(crate) fn field_f64(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(Value::as_f64)
}

pub(crate) fn field_i64(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub(crate) fn field_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

pub(crate) fn field_codes(fields: &Map<String, Value>) -> Vec<String> {
    fields
        .get("errors")
        .map(crate::error_codes::extract_codes)
        .unwrap_or_default()
}
