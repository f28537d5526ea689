//! Zone commands: list, status, control.

use std::fmt::Write as _;
use std::time::Instant;

use airzone_api::HttpTransport;
use airzone_core::{Client, Mode, SystemState, ZoneState, ZoneUpdate};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::cli::{ControlArgs, GlobalOpts, OutputFormat, Power, ZoneArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util::{fmt_opt, fmt_temp, fmt_wifi, on_off, zone_summary};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "System")]
    system: u32,
    #[tabled(rename = "Zone")]
    zone: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: &'static str,
    #[tabled(rename = "Temp")]
    temp: String,
    #[tabled(rename = "Setpoint")]
    setpoint: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Errors")]
    errors: String,
}

impl From<&ZoneState> for ZoneRow {
    fn from(z: &ZoneState) -> Self {
        let units = z.units();
        Self {
            system: z.system_id,
            zone: z.zone_id,
            name: z.display_name(),
            power: on_off(z.is_on()),
            temp: fmt_temp(z.room_temp(), units),
            setpoint: fmt_temp(z.setpoint(), units),
            mode: z.mode_name(),
            humidity: z.humidity().map_or_else(|| "-".into(), |h| format!("{h}%")),
            errors: z.error_codes().join(", "),
        }
    }
}

// ── list ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SystemView {
    #[serde(flatten)]
    system: SystemState,
    zones: Vec<ZoneState>,
}

#[derive(Serialize)]
struct ListReport {
    host: String,
    port: u16,
    response_secs: f64,
    webserver: Value,
    systems: Vec<SystemView>,
}

pub async fn list(client: &Client<HttpTransport>, global: &GlobalOpts) -> Result<(), CliError> {
    let refresh = global.refresh;

    // Always live: this doubles as the connectivity probe.
    let started = Instant::now();
    client.version(true).await?;
    let elapsed = started.elapsed();

    let webserver = client.webserver(refresh).await?;
    let mut systems = Vec::new();
    for system in client.systems(refresh).await? {
        let zones = client.zones(system.system_id, refresh).await?;
        systems.push(SystemView { system, zones });
    }

    let report = ListReport {
        host: client.host().to_owned(),
        port: client.port(),
        response_secs: elapsed.as_secs_f64(),
        webserver,
        systems,
    };

    let paint = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| format_list(r, paint),
        |r| {
            r.systems
                .iter()
                .flat_map(|s| s.zones.iter())
                .map(|z| format!("{}/{}", z.system_id, z.zone_id))
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn format_list(report: &ListReport, paint: Painter) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", paint.heading("Connection"));
    let _ = writeln!(out, "  Host:      {}:{}", report.host, report.port);
    let _ = writeln!(
        out,
        "  Status:    {} (response time: {:.2}s)",
        paint.good("Connected"),
        report.response_secs,
    );
    let ws = &report.webserver;
    let interface = ws.get("interface").and_then(Value::as_str).unwrap_or("unknown");
    let _ = writeln!(out, "  Interface: {interface}");
    if interface == "wifi" {
        if let Some(wifi) = fmt_wifi(ws) {
            let _ = writeln!(out, "  WiFi:      {wifi}");
        }
    }
    if let Some(alias) = ws.get("alias").and_then(Value::as_str) {
        let _ = writeln!(out, "  Device:    {alias}");
    }

    if report.systems.is_empty() {
        let _ = write!(out, "\nNo systems found");
        return out;
    }

    for view in &report.systems {
        let s = &view.system;
        let _ = writeln!(out, "\n{}", paint.heading(&s.name()));
        let _ = writeln!(out, "  System ID:    {}", s.system_id);
        let _ = writeln!(out, "  Manufacturer: {}", s.manufacturer().unwrap_or("-"));
        let _ = writeln!(out, "  Firmware:     {}", s.firmware().unwrap_or("-"));
        let codes = s.error_codes();
        if !codes.is_empty() {
            let _ = writeln!(out, "  Errors:       {}", paint.bad(&codes.join(", ")));
        }
    }

    let rows: Vec<ZoneRow> = report
        .systems
        .iter()
        .flat_map(|s| s.zones.iter())
        .map(ZoneRow::from)
        .collect();
    let _ = write!(out, "\n{}", output::render_table(&rows));
    out
}

// ── status ──────────────────────────────────────────────────────────

pub async fn status(
    client: &Client<HttpTransport>,
    args: &ZoneArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let zone = client.zone(args.system, args.zone, global.refresh).await?;
    let paint = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &zone,
        |z| zone_detail(z, paint),
        |z| format!("{}/{}", z.system_id, z.zone_id),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn zone_detail(z: &ZoneState, paint: Painter) -> String {
    let units = z.units();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} (System {}, Zone {})",
        paint.heading(&z.display_name()),
        z.system_id,
        z.zone_id
    );
    let _ = writeln!(out, "  Power:       {}", on_off(z.is_on()));
    let _ = writeln!(out, "  Temperature: {}", fmt_temp(z.room_temp(), units));
    let _ = writeln!(
        out,
        "  Setpoint:    {} (range {}-{})",
        fmt_temp(z.setpoint(), units),
        z.min_temp(),
        z.max_temp()
    );
    let _ = writeln!(out, "  Mode:        {}", z.mode_name());
    let modes = z.available_modes();
    if !modes.is_empty() {
        let names: Vec<String> = modes
            .iter()
            .map(|m| Mode::from_code(*m).map_or_else(|| m.to_string(), |mode| mode.to_string()))
            .collect();
        let _ = writeln!(out, "  Modes:       {}", names.join(", "));
    }
    let _ = writeln!(out, "  Fan speed:   {}", fmt_opt(z.speed()));
    let _ = writeln!(
        out,
        "  Sleep:       {}",
        z.sleep().map_or_else(|| "-".into(), |m| format!("{m} min"))
    );
    let _ = writeln!(
        out,
        "  Humidity:    {}",
        z.humidity().map_or_else(|| "-".into(), |h| format!("{h}%"))
    );
    if let Some(quality) = z.air_quality() {
        let _ = writeln!(out, "  Air quality: {quality}");
    }
    let codes = z.error_codes();
    if codes.is_empty() {
        let _ = write!(out, "  Errors:      {}", paint.good("none"));
    } else {
        let _ = write!(out, "  Errors:      {}", paint.bad(&codes.join(", ")));
    }
    out
}

// ── control ─────────────────────────────────────────────────────────

pub async fn control(
    client: &Client<HttpTransport>,
    args: &ControlArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (system_id, zone_id) = (args.target.system, args.target.zone);
    let requested = requested_update(args)?;
    if requested.is_empty() {
        return Err(CliError::Validation {
            field: "parameters".into(),
            reason: "nothing to change; pass --power, --setpoint, --mode, --fan-speed or --sleep"
                .into(),
        });
    }

    let before = client.zone(system_id, zone_id, true).await?;
    before.check_update(&requested)?;

    let update = effective_update(&before, &requested);
    let changes = describe_changes(&before, &update);

    let mut text = String::new();
    let _ = writeln!(
        text,
        "Controlling zone: {} (System {system_id}, Zone {zone_id})",
        before.display_name()
    );
    let _ = writeln!(text, "Initial state: {}", zone_summary(&before));

    if update.is_empty() {
        let _ = write!(text, "\nNo changes applied");
        if matches!(global.output, OutputFormat::Table) {
            output::print_output(&text, global.quiet);
        } else {
            print_zone(&before, global);
        }
        return Ok(());
    }

    client.set_zone(system_id, zone_id, &update).await?;
    let after = client.zone(system_id, zone_id, true).await?;

    let _ = writeln!(text, "\nChanges applied:");
    for change in &changes {
        let _ = writeln!(text, "  {change}");
    }
    let _ = write!(text, "\nFinal state: {}", zone_summary(&after));

    if matches!(global.output, OutputFormat::Table) {
        output::print_output(&text, global.quiet);
    } else {
        print_zone(&after, global);
    }
    Ok(())
}

fn print_zone(zone: &ZoneState, global: &GlobalOpts) {
    let out = output::render_single(
        &global.output,
        zone,
        zone_summary,
        |z| format!("{}/{}", z.system_id, z.zone_id),
    );
    output::print_output(&out, global.quiet);
}

fn requested_update(args: &ControlArgs) -> Result<ZoneUpdate, CliError> {
    let mode = match args.mode {
        Some(code) => Some(Mode::from_code(i64::from(code)).ok_or_else(|| {
            CliError::Validation {
                field: "mode".into(),
                reason: format!("{code} is not a known mode (1-5)"),
            }
        })?),
        None => None,
    };
    Ok(ZoneUpdate {
        on: args.power.map(|p| p == Power::On),
        setpoint: args.setpoint,
        mode,
        speed: args.fan_speed,
        sleep: args.sleep,
    })
}

/// Drop parameters that already match the zone's current state.
fn effective_update(zone: &ZoneState, requested: &ZoneUpdate) -> ZoneUpdate {
    ZoneUpdate {
        on: requested.on.filter(|on| *on != zone.is_on()),
        setpoint: requested
            .setpoint
            .filter(|sp| zone.setpoint().is_none_or(|cur| (cur - sp).abs() > 1e-6)),
        mode: requested
            .mode
            .filter(|m| zone.mode_code() != Some(i64::from(m.code()))),
        speed: requested
            .speed
            .filter(|s| zone.speed() != Some(i64::from(*s))),
        sleep: requested
            .sleep
            .filter(|s| zone.sleep() != Some(i64::from(*s))),
    }
}

fn describe_changes(zone: &ZoneState, update: &ZoneUpdate) -> Vec<String> {
    let units = zone.units();
    let mut changes = Vec::new();
    if let Some(on) = update.on {
        changes.push(format!("Power: {} -> {}", on_off(!on), on_off(on)));
    }
    if let Some(sp) = update.setpoint {
        changes.push(format!(
            "Setpoint: {} -> {}",
            fmt_temp(zone.setpoint(), units),
            fmt_temp(Some(sp), units)
        ));
    }
    if let Some(mode) = update.mode {
        changes.push(format!("Mode: {} -> {mode}", zone.mode_name()));
    }
    if let Some(speed) = update.speed {
        changes.push(format!("Fan Speed: {} -> {speed}", fmt_opt(zone.speed())));
    }
    if let Some(sleep) = update.sleep {
        changes.push(format!("Sleep Timer: {} min -> {sleep} min", fmt_opt(zone.sleep())));
    }
    changes
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn zone(body: &Value) -> ZoneState {
        serde_json::from_value(body.clone()).unwrap_or_else(|e| panic!("bad fixture: {e}"))
    }

    #[test]
    fn unchanged_parameters_are_not_sent() {
        let z = zone(&json!({
            "systemID": 1, "zoneID": 1, "on": 1, "setpoint": 22.0, "mode": 2, "speed": 1
        }));
        let requested = ZoneUpdate {
            on: Some(true),
            setpoint: Some(24.0),
            mode: Some(Mode::Cooling),
            speed: Some(3),
            sleep: None,
        };
        let update = effective_update(&z, &requested);
        assert_eq!(update.on, None);
        assert_eq!(update.mode, None);
        assert_eq!(update.setpoint, Some(24.0));
        assert_eq!(update.speed, Some(3));

        let changes = describe_changes(&z, &update);
        assert_eq!(changes, vec!["Setpoint: 22.0°C -> 24.0°C", "Fan Speed: 1 -> 3"]);
    }
}
