//! `airzone check`: one-shot configuration summary of the whole device.

use std::fmt::Write as _;

use airzone_api::HttpTransport;
use airzone_core::{Client, SystemState, ZoneState};
use serde::Serialize;
use serde_json::Value;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util::{fmt_temp, on_off};

#[derive(Debug, Serialize)]
struct DeviceInfo {
    host: String,
    port: u16,
    mac: Option<String>,
    alias: Option<String>,
    firmware: Option<String>,
    api_version: Option<String>,
}

#[derive(Debug, Serialize)]
struct ZoneInfo {
    id: u32,
    name: String,
    on: bool,
    temperature: Option<f64>,
    setpoint: Option<f64>,
    mode: Option<i64>,
    mode_name: String,
    humidity: Option<i64>,
    errors: Vec<String>,
    #[serde(skip)]
    units: airzone_core::Units,
}

#[derive(Debug, Serialize)]
struct SystemInfo {
    id: u32,
    manufacturer: Option<String>,
    firmware: Option<String>,
    errors: Vec<String>,
    zones: Vec<ZoneInfo>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    device: DeviceInfo,
    systems: Vec<SystemInfo>,
    zone_count: usize,
    error_count: usize,
    healthy: bool,
}

impl From<&ZoneState> for ZoneInfo {
    fn from(z: &ZoneState) -> Self {
        Self {
            id: z.zone_id,
            name: z.display_name(),
            on: z.is_on(),
            temperature: z.room_temp(),
            setpoint: z.setpoint(),
            mode: z.mode_code(),
            mode_name: z.mode_name(),
            humidity: z.humidity(),
            errors: z.error_codes(),
            units: z.units(),
        }
    }
}

fn system_info(system: &SystemState, zones: &[ZoneState]) -> SystemInfo {
    SystemInfo {
        id: system.system_id,
        manufacturer: system.manufacturer().map(str::to_owned),
        firmware: system.firmware().map(str::to_owned),
        errors: system.error_codes(),
        zones: zones.iter().map(ZoneInfo::from).collect(),
    }
}

fn build_report(device: DeviceInfo, systems: Vec<SystemInfo>) -> CheckReport {
    let zone_count = systems.iter().map(|s| s.zones.len()).sum();
    let error_count = systems
        .iter()
        .map(|s| s.errors.len() + s.zones.iter().map(|z| z.errors.len()).sum::<usize>())
        .sum();
    CheckReport {
        device,
        systems,
        zone_count,
        error_count,
        healthy: error_count == 0,
    }
}

pub async fn handle(client: &Client<HttpTransport>, global: &GlobalOpts) -> Result<(), CliError> {
    let refresh = global.refresh;
    let webserver = client.webserver(refresh).await?;
    let version = client.version(refresh).await?;

    let text = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_owned);
    let device = DeviceInfo {
        host: client.host().to_owned(),
        port: client.port(),
        mac: text(&webserver, "mac"),
        alias: text(&webserver, "alias"),
        firmware: text(&webserver, "ws_firmware"),
        api_version: text(&version, "version"),
    };

    let mut systems = Vec::new();
    for system in client.systems(refresh).await? {
        let zones = client.zones(system.system_id, refresh).await?;
        systems.push(system_info(&system, &zones));
    }
    let report = build_report(device, systems);

    let paint = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| format_report(r, paint),
        |r| if r.healthy { "ok".into() } else { "errors".into() },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn format_report(report: &CheckReport, paint: Painter) -> String {
    let d = &report.device;
    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "Unknown".into());

    let mut out = String::new();
    let _ = writeln!(out, "{}", paint.heading("Device"));
    let _ = writeln!(out, "  Address:     {}:{}", d.host, d.port);
    let _ = writeln!(out, "  Alias:       {}", or_unknown(&d.alias));
    let _ = writeln!(out, "  MAC:         {}", or_unknown(&d.mac));
    let _ = writeln!(out, "  Firmware:    {}", or_unknown(&d.firmware));
    let _ = writeln!(out, "  API version: {}", or_unknown(&d.api_version));

    for system in &report.systems {
        let _ = writeln!(out, "\n{}", paint.heading(&format!("System {}", system.id)));
        let _ = writeln!(out, "  Manufacturer: {}", or_unknown(&system.manufacturer));
        let _ = writeln!(out, "  Firmware:     {}", or_unknown(&system.firmware));
        if !system.errors.is_empty() {
            let _ = writeln!(out, "  Errors:       {}", paint.bad(&system.errors.join(", ")));
        }
        let _ = writeln!(out, "  Zones ({}):", system.zones.len());
        for zone in &system.zones {
            let _ = write!(
                out,
                "    Zone {}: {} [{}] {} -> {} {}",
                zone.id,
                zone.name,
                on_off(zone.on),
                fmt_temp(zone.temperature, zone.units),
                fmt_temp(zone.setpoint, zone.units),
                zone.mode_name,
            );
            if !zone.errors.is_empty() {
                let _ = write!(out, " {}", paint.bad(&zone.errors.join(", ")));
            }
            out.push('\n');
        }
    }

    let summary = format!(
        "{} system(s), {} zone(s), {} error(s)",
        report.systems.len(),
        report.zone_count,
        report.error_count
    );
    let _ = write!(
        out,
        "\n{}",
        if report.healthy {
            paint.good(&summary)
        } else {
            paint.bad(&summary)
        }
    );
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn zone(body: &Value) -> ZoneState {
        serde_json::from_value(body.clone()).unwrap_or_else(|e| panic!("bad fixture: {e}"))
    }

    fn device() -> DeviceInfo {
        DeviceInfo {
            host: "10.0.0.5".into(),
            port: 3000,
            mac: None,
            alias: None,
            firmware: None,
            api_version: None,
        }
    }

    #[test]
    fn errors_in_zones_make_report_unhealthy() {
        let system: SystemState =
            serde_json::from_value(json!({ "systemID": 1, "errors": [] })).unwrap_or_else(|e| {
                panic!("bad fixture: {e}")
            });
        let zones = vec![
            zone(&json!({ "systemID": 1, "zoneID": 1, "errors": [{ "Zone": "Error 12" }] })),
            zone(&json!({ "systemID": 1, "zoneID": 2 })),
        ];
        let report = build_report(device(), vec![system_info(&system, &zones)]);
        assert_eq!(report.zone_count, 2);
        assert_eq!(report.error_count, 1);
        assert!(!report.healthy);
    }

    #[test]
    fn empty_device_is_healthy() {
        let report = build_report(device(), Vec::new());
        assert!(report.healthy);
        let text = format_report(&report, Painter::new(&crate::cli::ColorMode::Never));
        assert!(text.ends_with("0 system(s), 0 zone(s), 0 error(s)"));
    }
}
