//! Clap derive structures for the `airzone` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// airzone -- local control and backup for Airzone HVAC webservers
#[derive(Debug, Parser)]
#[command(
    name = "airzone",
    version,
    about = "Monitor, control, and back up Airzone HVAC systems over the local API",
    long_about = "Talks to an Airzone webserver on your LAN (http://<host>:3000/api/v1).\n\n\
        Reads are cached on disk for a few seconds (identity data for an hour),\n\
        writes invalidate the cache, and backups capture every system, zone,\n\
        and IAQ sensor for later comparison.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Webserver profile to use
    #[arg(long, short = 'p', env = "AIRZONE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Webserver IP address or hostname (overrides profile)
    #[arg(long, short = 'H', env = "AIRZONE_IP", global = true)]
    pub host: Option<String>,

    /// Webserver HTTP port (overrides profile)
    #[arg(long, env = "AIRZONE_PORT", global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AIRZONE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "AIRZONE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Bypass the response cache entirely
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Ignore cached responses but store the fresh ones
    #[arg(long, alias = "force-refresh", global = true)]
    pub refresh: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show connection status and every system with its zones
    #[command(alias = "ls")]
    List,

    /// Show the state of one zone
    Status(ZoneArgs),

    /// Change power, setpoint, mode, fan speed, or sleep timer of a zone
    #[command(alias = "set")]
    Control(ControlArgs),

    /// Report device errors with explanations and remedies
    Errors(ErrorsArgs),

    /// Summarize the webserver and every system's configuration
    Check,

    /// Indoor air quality sensors
    Iaq(IaqArgs),

    /// Capture, inspect, and compare backups
    Backup(BackupArgs),

    /// Inspect or clear the response cache
    Cache(CacheArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ZONES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ZoneArgs {
    /// System ID
    #[arg(long, short = 's')]
    pub system: u32,

    /// Zone ID
    #[arg(long, short = 'z')]
    pub zone: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Power {
    On,
    Off,
}

#[derive(Debug, Args)]
pub struct ControlArgs {
    #[command(flatten)]
    pub target: ZoneArgs,

    /// Turn the zone on or off
    #[arg(long)]
    pub power: Option<Power>,

    /// Temperature setpoint, in the zone's units
    #[arg(long, allow_negative_numbers = true)]
    pub setpoint: Option<f64>,

    /// Mode (1=Stop, 2=Cooling, 3=Heating, 4=Ventilation, 5=Dehumidify)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub mode: Option<u8>,

    /// Fan speed (0=auto on most units)
    #[arg(long)]
    pub fan_speed: Option<u32>,

    /// Sleep timer in minutes (0 disables)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=1440))]
    pub sleep: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ErrorsArgs {
    /// Also write the findings as a JSON log to this file
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  IAQ
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct IaqArgs {
    #[command(subcommand)]
    pub command: IaqCommand,
}

#[derive(Debug, Subcommand)]
pub enum IaqCommand {
    /// List IAQ sensors of every system (or one)
    #[command(alias = "ls")]
    List {
        /// Only this system
        #[arg(long, short = 's')]
        system: Option<u32>,
    },

    /// Show one sensor's readings
    Status(SensorArgs),

    /// Change a sensor's ventilation mode
    Control {
        #[command(flatten)]
        target: SensorArgs,

        /// Ventilation mode (0=Off, 1=On, 2=Auto)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
        ventilation: u8,
    },
}

#[derive(Debug, Args)]
pub struct SensorArgs {
    /// System ID
    #[arg(long, short = 's')]
    pub system: u32,

    /// Sensor ID
    #[arg(long)]
    pub sensor: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BACKUP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Backup directory (overrides profile)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: BackupCommand,
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Capture every system, zone, and IAQ sensor into a new backup file
    Create {
        /// Skip IAQ sensors (for webservers without an IAQ endpoint)
        #[arg(long)]
        no_sensors: bool,

        /// Maximum concurrent per-system requests
        #[arg(long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..=32))]
        concurrency: u16,
    },

    /// List backups in the backup directory
    #[command(alias = "ls")]
    List,

    /// Check a backup file for structural and range errors
    Validate {
        /// Backup file name (in the backup directory) or path
        file: String,
    },

    /// Preview how live state differs from a backup (never writes)
    #[command(alias = "diff")]
    Restore {
        /// Backup file name (in the backup directory) or path
        file: String,

        /// Which fields to compare
        #[arg(long, default_value = "control")]
        scope: ScopeArg,

        /// Accepted for compatibility; restore is always a preview
        #[arg(long, hide = true)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Configuration fields only (power, setpoint, mode, fan, slats, names)
    Control,
    /// Every field, including live readings
    All,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CACHE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached responses with their age and freshness
    Status,

    /// Remove every cached response
    Clear,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a field on the active profile
    Set {
        /// Profile key (host, port, cache, cache_dir, backup_dir,
        /// identity_ttl_secs, live_ttl_secs, timeout)
        key: String,

        /// New value
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
