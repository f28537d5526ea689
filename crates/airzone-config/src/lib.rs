//! Shared configuration for Airzone tools.
//!
//! TOML profiles (one per webserver), platform paths for the config file,
//! response cache, and backups, and translation to
//! `airzone_core::ClientConfig`. The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use airzone_core::{CacheSettings, ClientConfig, TtlPolicy};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named webserver profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile to use: `requested`, else `default_profile`, else "default".
    pub fn profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Use the response cache unless a profile says otherwise.
    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            cache: true,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

/// A named webserver profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Webserver IP address or hostname.
    pub host: String,

    /// Webserver HTTP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Override the global cache setting.
    pub cache: Option<bool>,

    /// Response cache directory.
    pub cache_dir: Option<PathBuf>,

    /// Where `backup create` writes and `backup list` looks.
    pub backup_dir: Option<PathBuf>,

    /// TTL for firmware/identity responses.
    pub identity_ttl_secs: Option<u64>,

    /// TTL for live HVAC and IAQ status.
    pub live_ttl_secs: Option<u64>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: default_port(),
            cache: None,
            cache_dir: None,
            backup_dir: None,
            identity_ttl_secs: None,
            live_ttl_secs: None,
            timeout: None,
        }
    }
}

pub const DEFAULT_HOST: &str = "192.168.1.100";

fn default_port() -> u16 {
    3000
}

// ── Platform paths ──────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "airzone", "airzone")
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("airzone");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default response cache directory.
pub fn default_cache_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".cache"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

/// Default backup directory.
pub fn default_backup_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("backups"),
        |dirs| dirs.data_dir().join("backups"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file (missing files contribute nothing).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AIRZONE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ClientConfig` from a profile and the global defaults.
///
/// Rejects TTL settings where identity data would expire before live status.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let fallback = TtlPolicy::default();
    let identity = profile
        .identity_ttl_secs
        .map_or(fallback.identity(), Duration::from_secs);
    let live = profile
        .live_ttl_secs
        .map_or(fallback.live(), Duration::from_secs);
    let ttl = TtlPolicy::new(identity, live).map_err(|e| ConfigError::Validation {
        field: "identity_ttl_secs".into(),
        reason: e.to_string(),
    })?;

    Ok(ClientConfig {
        host: profile.host.trim().to_owned(),
        port: profile.port,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        cache: CacheSettings {
            enabled: profile.cache.unwrap_or(defaults.cache),
            dir: profile.cache_dir.clone().unwrap_or_else(default_cache_dir),
            ttl,
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "home"

[defaults]
output = "json"

[profiles.home]
host = "10.0.0.5"
live_ttl_secs = 5
cache = false
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.profile_name(None), "home");
        assert_eq!(cfg.profile_name(Some("other")), "other");
        assert_eq!(cfg.defaults.output, "json");

        let home = &cfg.profiles["home"];
        assert_eq!(home.port, 3000);
        let client = profile_to_client_config(home, &cfg.defaults).unwrap();
        assert_eq!(client.host, "10.0.0.5");
        assert!(!client.cache.enabled);
        assert_eq!(client.cache.ttl.live(), Duration::from_secs(5));
        assert_eq!(client.timeout, Duration::from_secs(10));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert!(cfg.defaults.cache);
    }

    #[test]
    fn rejects_identity_ttl_below_live_ttl() {
        let profile = Profile {
            identity_ttl_secs: Some(5),
            live_ttl_secs: Some(60),
            ..Profile::default()
        };
        let result = profile_to_client_config(&profile, &Defaults::default());
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn save_then_load_preserves_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                host: "airzone.lan".into(),
                backup_dir: Some(PathBuf::from("/srv/backups")),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let profile = &loaded.profiles["default"];
        assert_eq!(profile.host, "airzone.lan");
        assert_eq!(profile.backup_dir.as_deref(), Some(Path::new("/srv/backups")));
    }
}
