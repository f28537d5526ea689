//! IAQ sensor commands: list, status, control.

use std::fmt::Write as _;

use airzone_api::HttpTransport;
use airzone_core::{Client, CoreError, SensorState, SensorUpdate, VentilationMode};
use tabled::Tabled;

use crate::cli::{GlobalOpts, IaqArgs, IaqCommand, OutputFormat, SensorArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util::fmt_opt;

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "System")]
    system: u32,
    #[tabled(rename = "Sensor")]
    sensor: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "CO2 (ppm)")]
    co2: String,
    #[tabled(rename = "PM2.5")]
    pm2_5: String,
    #[tabled(rename = "PM10")]
    pm10: String,
    #[tabled(rename = "TVOC (ppb)")]
    tvoc: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Ventilation")]
    ventilation: String,
}

impl From<&SensorState> for SensorRow {
    fn from(s: &SensorState) -> Self {
        Self {
            system: s.system_id,
            sensor: s.sensor_id,
            name: s.display_name(),
            co2: fmt_opt(s.co2()),
            pm2_5: fmt_opt(s.pm2_5()),
            pm10: fmt_opt(s.pm10()),
            tvoc: fmt_opt(s.tvoc()),
            score: fmt_opt(s.iaq_score()),
            ventilation: ventilation_name(s),
        }
    }
}

fn ventilation_name(s: &SensorState) -> String {
    match (s.ventilation(), s.ventilation_code()) {
        (Some(mode), _) => mode.to_string(),
        (None, Some(code)) => format!("Unknown ({code})"),
        (None, None) => "-".into(),
    }
}

fn sensor_id(s: &SensorState) -> String {
    format!("{}/{}", s.system_id, s.sensor_id)
}

pub async fn handle(
    client: &Client<HttpTransport>,
    args: IaqArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        IaqCommand::List { system } => list(client, system, global).await,
        IaqCommand::Status(target) => status(client, &target, global).await,
        IaqCommand::Control {
            target,
            ventilation,
        } => control(client, &target, ventilation, global).await,
    }
}

async fn list(
    client: &Client<HttpTransport>,
    system: Option<u32>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let refresh = global.refresh;
    let sensors = match system {
        Some(system_id) => client.sensors(system_id, refresh).await?,
        None => {
            let mut all = Vec::new();
            for system in client.systems(refresh).await? {
                // Systems without IAQ hardware answer with a device error.
                match client.sensors(system.system_id, refresh).await {
                    Ok(sensors) => all.extend(sensors),
                    Err(CoreError::Device { message, .. }) => {
                        tracing::info!(system = system.system_id, %message, "no IAQ sensors");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            all
        }
    };

    if sensors.is_empty() && matches!(global.output, OutputFormat::Table) {
        output::print_output("No IAQ sensors found", global.quiet);
        return Ok(());
    }
    let out = output::render_list(&global.output, &sensors, |s| SensorRow::from(s), sensor_id);
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn status(
    client: &Client<HttpTransport>,
    target: &SensorArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let sensor = client
        .sensor(target.system, target.sensor, global.refresh)
        .await?;
    let paint = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &sensor,
        |s| sensor_detail(s, paint),
        sensor_id,
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn sensor_detail(s: &SensorState, paint: Painter) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} (System {}, Sensor {})",
        paint.heading(&s.display_name()),
        s.system_id,
        s.sensor_id
    );
    let _ = writeln!(out, "  CO2:         {} ppm", fmt_opt(s.co2()));
    let _ = writeln!(out, "  PM2.5:       {} µg/m³", fmt_opt(s.pm2_5()));
    let _ = writeln!(out, "  PM10:        {} µg/m³", fmt_opt(s.pm10()));
    let _ = writeln!(out, "  TVOC:        {} ppb", fmt_opt(s.tvoc()));
    let _ = writeln!(out, "  Pressure:    {} hPa", fmt_opt(s.pressure()));
    let _ = writeln!(out, "  IAQ index:   {}", fmt_opt(s.iaq_index()));
    let _ = writeln!(out, "  IAQ score:   {}", fmt_opt(s.iaq_score()));
    let _ = write!(out, "  Ventilation: {}", ventilation_name(s));
    out
}

async fn control(
    client: &Client<HttpTransport>,
    target: &SensorArgs,
    ventilation: u8,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mode = VentilationMode::from_code(i64::from(ventilation)).ok_or_else(|| {
        CliError::Validation {
            field: "ventilation".into(),
            reason: format!("{ventilation} is not a ventilation mode (0-2)"),
        }
    })?;

    let before = client.sensor(target.system, target.sensor, true).await?;
    let mut text = String::new();
    let _ = writeln!(
        text,
        "Controlling IAQ sensor: {} (System {}, Sensor {})",
        before.display_name(),
        target.system,
        target.sensor
    );
    let _ = writeln!(text, "Initial ventilation mode: {}", ventilation_name(&before));

    let after = if before.ventilation() == Some(mode) {
        let _ = write!(text, "\nNo changes applied");
        before
    } else {
        let update = SensorUpdate {
            ventilation: Some(mode),
        };
        client
            .set_sensor(target.system, target.sensor, &update)
            .await?;
        let after = client.sensor(target.system, target.sensor, true).await?;
        let _ = write!(
            text,
            "Ventilation mode changed: {} -> {}",
            ventilation_name(&before),
            ventilation_name(&after)
        );
        after
    };

    if matches!(global.output, OutputFormat::Table) {
        output::print_output(&text, global.quiet);
    } else {
        let out = output::render_single(&global.output, &after, ventilation_name, sensor_id);
        output::print_output(&out, global.quiet);
    }
    Ok(())
}
