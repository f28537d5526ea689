//! `airzone errors`: scan every system and zone for reported error codes.

use std::fmt::Write as _;

use airzone_api::HttpTransport;
use airzone_core::Client;
use airzone_core::error_codes::{self, EntityError, MANUAL_INTERVENTION};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{ErrorsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter};

/// One finding, with its catalog explanation.
#[derive(Debug, Serialize)]
struct ErrorRecord {
    detected_at: DateTime<Utc>,
    system_id: u32,
    zone_id: Option<u32>,
    zone_name: Option<String>,
    code: String,
    known: bool,
    description: &'static str,
    solutions: &'static [&'static str],
}

impl ErrorRecord {
    fn new(found: &EntityError, detected_at: DateTime<Utc>) -> Self {
        let info = found.info();
        Self {
            detected_at,
            system_id: found.system_id,
            zone_id: found.zone_id,
            zone_name: found.zone_name.clone(),
            code: info.code,
            known: info.known,
            description: info.description,
            solutions: info.solutions,
        }
    }
}

pub async fn handle(
    client: &Client<HttpTransport>,
    args: &ErrorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let refresh = global.refresh;
    let webserver = client.webserver(refresh).await?;
    let systems = client.systems(refresh).await?;
    let mut zones = Vec::new();
    for system in &systems {
        zones.extend(client.zones(system.system_id, refresh).await?);
    }

    let now = Utc::now();
    let records: Vec<ErrorRecord> = error_codes::collect_errors(&systems, &zones)
        .iter()
        .map(|e| ErrorRecord::new(e, now))
        .collect();

    for record in &records {
        match record.zone_id {
            Some(zone_id) => tracing::warn!(
                system = record.system_id,
                zone = zone_id,
                code = %record.code,
                "zone reports an error"
            ),
            None => tracing::warn!(system = record.system_id, code = %record.code, "system reports an error"),
        }
    }

    if let Some(path) = &args.save {
        let mut bytes = serde_json::to_vec_pretty(&records)?;
        bytes.push(b'\n');
        std::fs::write(path, bytes)?;
        if !global.quiet {
            eprintln!("Error details saved to {}", path.display());
        }
    }

    let paint = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        records.as_slice(),
        |r| format_report(&webserver, r, paint),
        |r| {
            r.iter()
                .map(|e| e.code.clone())
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn format_report(webserver: &Value, records: &[ErrorRecord], paint: Painter) -> String {
    let field = |key: &str| {
        webserver
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_owned()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", paint.heading("Webserver"));
    let _ = writeln!(out, "  MAC Address: {}", field("mac"));
    let _ = writeln!(out, "  Firmware:    {}", field("ws_firmware"));
    let _ = writeln!(out, "  Interface:   {}", field("interface"));

    if records.is_empty() {
        let _ = write!(
            out,
            "\n{}",
            paint.good("No errors detected in any system or zone.")
        );
        return out;
    }

    for record in records {
        let title = match (record.zone_id, &record.zone_name) {
            (Some(zone_id), Some(name)) => format!(
                "Zone {name} (System {}, Zone {zone_id})",
                record.system_id
            ),
            (Some(zone_id), None) => format!("Zone {zone_id} (System {})", record.system_id),
            (None, _) => format!("System {}", record.system_id),
        };
        let _ = writeln!(out, "\n{}", paint.bad(&title));
        let _ = writeln!(out, "  Error:       {}", record.code);
        let _ = writeln!(out, "  Description: {}", record.description);
        let _ = writeln!(out, "  Solutions:");
        for (i, solution) in record.solutions.iter().enumerate() {
            let _ = writeln!(out, "    {}. {solution}", i + 1);
        }
    }

    let _ = writeln!(out, "\n{}", paint.warn("Manual intervention required"));
    let _ = writeln!(
        out,
        "  The local API cannot restart the webserver or units. To clear errors:"
    );
    for (i, step) in MANUAL_INTERVENTION.iter().enumerate() {
        let _ = write!(out, "    {}. {step}", i + 1);
        if i + 1 < MANUAL_INTERVENTION.len() {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::cli::ColorMode;

    use super::*;

    #[test]
    fn report_numbers_solutions_and_ends_with_manual_steps() {
        let found = EntityError {
            system_id: 2,
            zone_id: Some(3),
            zone_name: Some("Oficina".into()),
            code: "9".into(),
        };
        let record = ErrorRecord::new(&found, Utc::now());
        assert_eq!(record.code, "Error 9");
        assert!(record.known);

        let text = format_report(
            &json!({ "mac": "AA:BB" }),
            &[record],
            Painter::new(&ColorMode::Never),
        );
        assert!(text.contains("Zone Oficina (System 2, Zone 3)"));
        assert!(text.contains("    1. Check physical connections"));
        assert!(text.contains("Firmware:    Unknown"));
        assert!(text.ends_with("contact Airzone technical support"));
    }

    #[test]
    fn clean_device_says_so() {
        let text = format_report(&json!({}), &[], Painter::new(&ColorMode::Never));
        assert!(text.ends_with("No errors detected in any system or zone."));
    }
}
