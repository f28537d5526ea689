//! CLI configuration: thin wrapper around `airzone_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--host, --port, --timeout, ...).

use std::path::PathBuf;

use airzone_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use airzone_config::{
    Config, DEFAULT_HOST, Defaults, Profile, config_path, default_backup_dir,
    load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// The profile to connect with.
///
/// An explicitly requested profile must exist. Without one, a missing
/// default profile falls back to built-in settings so `--host` alone is
/// enough.
pub fn active_profile(global: &GlobalOpts, config: &Config) -> Result<Profile, CliError> {
    let name = active_profile_name(global, config);
    match config.profiles.get(&name) {
        Some(profile) => Ok(profile.clone()),
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name,
            available: available_profiles(config),
        }),
        None => Ok(Profile::default()),
    }
}

pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Translate the active profile plus flag overrides into a `ClientConfig`.
///
/// Flags and environment variables win over profile values.
pub fn resolve_client_config(global: &GlobalOpts, config: &Config) -> Result<ClientConfig, CliError> {
    let mut profile = active_profile(global, config)?;

    if let Some(host) = &global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if let Some(timeout) = global.timeout {
        if timeout == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        profile.timeout = Some(timeout);
    }
    if global.no_cache {
        profile.cache = Some(false);
    }

    Ok(airzone_config::profile_to_client_config(
        &profile,
        &config.defaults,
    )?)
}

/// Backup directory: `--dir`, else the profile's, else the platform default.
pub fn resolve_backup_dir(
    explicit: Option<&PathBuf>,
    global: &GlobalOpts,
    config: &Config,
) -> Result<PathBuf, CliError> {
    if let Some(dir) = explicit {
        return Ok(dir.clone());
    }
    let profile = active_profile(global, config)?;
    Ok(profile.backup_dir.unwrap_or_else(default_backup_dir))
}
