//! Shared helpers for command handlers.

use airzone_core::{Units, ZoneState};
use serde_json::Value;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

// ── Formatting ──────────────────────────────────────────────────────

pub fn fmt_temp(value: Option<f64>, units: Units) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.1}{}", units.symbol()))
}

pub fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

pub fn on_off(on: bool) -> &'static str {
    if on { "On" } else { "Off" }
}

/// `-61 dBm (78%) Ch6`, omitting quality and channel when unreported.
pub fn fmt_wifi(webserver: &Value) -> Option<String> {
    let rssi = webserver.get("wifi_rssi").and_then(Value::as_i64)?;
    let mut out = format!("{rssi} dBm");
    if let Some(quality) = webserver
        .get("wifi_quality")
        .and_then(Value::as_i64)
        .filter(|q| *q > 0)
    {
        out.push_str(&format!(" ({quality}%)"));
    }
    if let Some(channel) = webserver
        .get("wifi_channel")
        .and_then(Value::as_i64)
        .filter(|c| *c > 0)
    {
        out.push_str(&format!(" Ch{channel}"));
    }
    Some(out)
}

/// One-line state used before and after a change.
pub fn zone_summary(zone: &ZoneState) -> String {
    let units = zone.units();
    format!(
        "{}, Setpoint {}, Mode {}, Power {}",
        fmt_temp(zone.room_temp(), units),
        fmt_temp(zone.setpoint(), units),
        zone.mode_name(),
        on_off(zone.is_on()),
    )
}

/// Render a JSON scalar for a table cell.
pub fn fmt_value(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn wifi_line_skips_unreported_parts() {
        let ws = json!({ "wifi_rssi": -61, "wifi_quality": 0, "wifi_channel": 6 });
        assert_eq!(fmt_wifi(&ws).as_deref(), Some("-61 dBm Ch6"));
        assert_eq!(fmt_wifi(&json!({ "interface": "eth" })), None);
    }

    #[test]
    fn temperatures_carry_units() {
        assert_eq!(fmt_temp(Some(22.46), Units::Celsius), "22.5°C");
        assert_eq!(fmt_temp(None, Units::Fahrenheit), "-");
    }
}
