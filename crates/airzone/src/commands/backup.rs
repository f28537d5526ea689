//! `airzone backup`: create, list, validate, and preview-restore backups.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::time::Duration;

use airzone_core::backup::{
    self, BackupEngine, BackupOptions, BackupStore, BackupSummary, DiffResult, DiffScope,
    EntityRef, FieldChange, Snapshot, ValidationReport,
};
use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::cli::{BackupArgs, BackupCommand, GlobalOpts, OutputFormat, ScopeArg};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util::fmt_value;

pub async fn handle(args: BackupArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let store = BackupStore::new(config::resolve_backup_dir(args.dir.as_ref(), global, cfg)?);

    match args.command {
        BackupCommand::Create {
            no_sensors,
            concurrency,
        } => {
            let options = BackupOptions {
                concurrency: usize::from(concurrency),
                include_sensors: !no_sensors,
            };
            create(&store, options, global, cfg).await
        }
        BackupCommand::List => list(&store, global),
        BackupCommand::Validate { file } => validate(&store, &file, global),
        BackupCommand::Restore { file, scope, .. } => restore(&store, &file, scope, global, cfg).await,
    }
}

fn spinner(global: &GlobalOpts, message: &'static str) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

// ── create ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateReport {
    path: String,
    size_bytes: u64,
    alias: String,
    mac: String,
    systems: usize,
    zones: usize,
    sensors: usize,
}

async fn create(
    store: &BackupStore,
    options: BackupOptions,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    let client = crate::connect(global, cfg)?;
    let engine = BackupEngine::with_options(&client, options);

    let bar = spinner(global, "Capturing systems, zones, and sensors...");
    let captured = engine.create_snapshot().await;
    bar.finish_and_clear();
    let (snapshot, _name) = captured?;

    check_before_save(&snapshot)?;
    let path = store.save_snapshot(&snapshot)?;
    let size_bytes = std::fs::metadata(&path).map_or(0, |m| m.len());

    let report = CreateReport {
        path: path.display().to_string(),
        size_bytes,
        alias: snapshot.device().alias.clone(),
        mac: snapshot.device().mac.clone(),
        systems: snapshot.systems().len(),
        zones: snapshot.zones().len(),
        sensors: snapshot.sensors().len(),
    };
    let paint = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            format!(
                "{} {}\n  Device:  {} ({})\n  Content: {} system(s), {} zone(s), {} IAQ sensor(s)\n  Size:    {}",
                paint.good("Backup written to"),
                r.path,
                r.alias,
                r.mac,
                r.systems,
                r.zones,
                r.sensors,
                ByteSize::b(r.size_bytes),
            )
        },
        |r| r.path.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Refuse to write a capture that `backup validate` would reject.
fn check_before_save(snapshot: &Snapshot) -> Result<(), CliError> {
    let report = backup::validate_snapshot(snapshot);
    if report.valid {
        return Ok(());
    }
    for issue in &report.errors {
        eprintln!("  {issue}");
    }
    Err(CliError::BackupInvalid {
        count: report.errors.len(),
    })
}

// ── list ────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct BackupRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Systems")]
    systems: String,
    #[tabled(rename = "Zones")]
    zones: String,
    #[tabled(rename = "Size")]
    size: String,
}

impl From<&BackupSummary> for BackupRow {
    fn from(b: &BackupSummary) -> Self {
        let count = |n: Option<usize>| n.map_or_else(|| "-".into(), |n| n.to_string());
        Self {
            name: b.name.clone(),
            created: b.created_at.or(b.modified).map_or_else(
                || "-".into(),
                |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
            device: if b.readable {
                match (&b.alias, &b.host) {
                    (Some(alias), Some(host)) => format!("{alias} ({host})"),
                    (Some(alias), None) => alias.clone(),
                    (None, Some(host)) => host.clone(),
                    (None, None) => "-".into(),
                }
            } else {
                "unreadable".into()
            },
            systems: count(b.systems),
            zones: count(b.zones),
            size: ByteSize::b(b.size_bytes).to_string(),
        }
    }
}

fn list(store: &BackupStore, global: &GlobalOpts) -> Result<(), CliError> {
    let backups = store.list()?;
    if backups.is_empty() && matches!(global.output, OutputFormat::Table) {
        output::print_output(
            &format!("No backups in {}", store.dir().display()),
            global.quiet,
        );
        return Ok(());
    }
    let out = output::render_list(
        &global.output,
        &backups,
        |b| BackupRow::from(b),
        |b| b.name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── validate ────────────────────────────────────────────────────────

fn validate(store: &BackupStore, file: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let bytes = store.load(file)?;
    let report = backup::validate_bytes(&bytes);
    let paint = Painter::new(&global.color);

    let out = output::render_single(
        &global.output,
        &report,
        |r| format_validation(file, r, paint),
        |r| {
            r.errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);

    if report.valid {
        Ok(())
    } else {
        Err(CliError::BackupInvalid {
            count: report.errors.len(),
        })
    }
}

fn format_validation(file: &str, report: &ValidationReport, paint: Painter) -> String {
    if report.valid {
        return format!("{} {file} is a valid backup", paint.good("✓"));
    }
    let mut out = format!(
        "{} {file} has {} problem(s):",
        paint.bad("✗"),
        report.errors.len()
    );
    for issue in &report.errors {
        let _ = write!(out, "\n  {}: {}", paint.warn(&issue.path), issue.reason);
    }
    out
}

// ── restore (preview) ───────────────────────────────────────────────

async fn restore(
    store: &BackupStore,
    file: &str,
    scope: ScopeArg,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    let bytes = store.load(file)?;
    let snapshot = match backup::deserialize(&bytes) {
        Ok(snapshot) => snapshot,
        Err(airzone_core::CoreError::Validation { report }) => {
            for issue in &report.errors {
                eprintln!("  {issue}");
            }
            return Err(CliError::BackupInvalid {
                count: report.errors.len(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let client = crate::connect(global, cfg)?;
    let engine = BackupEngine::new(&client);
    let scope = match scope {
        ScopeArg::Control => DiffScope::Control,
        ScopeArg::All => DiffScope::All,
    };

    let bar = spinner(global, "Reading live state...");
    let compared = engine.diff_against_live(&snapshot, scope).await;
    bar.finish_and_clear();
    let result = compared?;

    if !result.same_device() && !global.quiet {
        eprintln!(
            "warning: backup was taken from {} ({}), but {} is {} ({})",
            result.source.alias,
            result.source.mac,
            client.host(),
            result.target.alias,
            result.target.mac
        );
    }

    let paint = Painter::new(&global.color);
    let out = output::render_single(
        &global.output,
        &result,
        |r| format_preview(file, r, paint),
        |r| suggested_commands(r).join("\n"),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Backup")]
    backup: String,
    #[tabled(rename = "Live")]
    live: String,
}

fn format_preview(file: &str, result: &DiffResult, paint: Painter) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {file} ({} / {})",
        paint.heading("Restore preview for"),
        result.source.alias,
        result.source.mac
    );

    if result.is_empty() {
        let _ = write!(out, "{}", paint.good("Live state matches the backup."));
        return out;
    }

    if !result.changed.is_empty() {
        let rows: Vec<ChangeRow> = result
            .changed
            .iter()
            .flat_map(|entity| {
                entity.changes.iter().map(move |c| ChangeRow {
                    entity: entity.entity.to_string(),
                    name: entity.name.clone(),
                    field: c.field.clone(),
                    backup: fmt_value(&c.old),
                    live: fmt_value(&c.new),
                })
            })
            .collect();
        let _ = writeln!(out, "{}", output::render_table(&rows));
    }
    for missing in &result.snapshot_only {
        let _ = writeln!(out, "{} {missing}", paint.warn("only in backup:"));
    }
    for extra in &result.live_only {
        let _ = writeln!(out, "{} {extra}", paint.warn("only on device:"));
    }

    let commands = suggested_commands(result);
    if !commands.is_empty() {
        let _ = writeln!(out, "\nTo bring the device back to the backup, run:");
        for cmd in &commands {
            let _ = writeln!(out, "  {cmd}");
        }
    }
    let _ = write!(
        out,
        "\n{}",
        paint.dim("Nothing was changed. The local API has no bulk restore.")
    );
    out
}

/// `airzone control` / `airzone iaq control` invocations that would undo
/// the writable part of each difference.
fn suggested_commands(result: &DiffResult) -> Vec<String> {
    result
        .changed
        .iter()
        .filter_map(|entity| match entity.entity {
            EntityRef::Zone { system_id, zone_id } => {
                let flags = zone_flags(&entity.changes);
                (!flags.is_empty())
                    .then(|| format!("airzone control -s {system_id} -z {zone_id}{flags}"))
            }
            EntityRef::Sensor {
                system_id,
                sensor_id,
            } => entity
                .changes
                .iter()
                .find(|c| c.field == "iaq_mode_vent")
                .and_then(|c| c.old.as_i64())
                .map(|v| {
                    format!(
                        "airzone iaq control -s {system_id} --sensor {sensor_id} --ventilation {v}"
                    )
                }),
            EntityRef::System { .. } => None,
        })
        .collect()
}

fn zone_flags(changes: &[FieldChange]) -> String {
    let mut flags = String::new();
    for change in changes {
        let old = &change.old;
        match change.field.as_str() {
            "on" => {
                if let Some(on) = old.as_i64() {
                    let _ = write!(flags, " --power {}", if on == 1 { "on" } else { "off" });
                }
            }
            "setpoint" => {
                if let Some(sp) = old.as_f64() {
                    let _ = write!(flags, " --setpoint {sp}");
                }
            }
            "mode" => push_int(&mut flags, "--mode", old),
            "speed" => push_int(&mut flags, "--fan-speed", old),
            "sleep" => push_int(&mut flags, "--sleep", old),
            _ => {}
        }
    }
    flags
}

fn push_int(flags: &mut String, flag: &str, value: &Value) {
    if let Some(v) = value.as_i64() {
        let _ = write!(flags, " {flag} {v}");
    }
}
