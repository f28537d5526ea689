//! Config subcommand handlers.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, DEFAULT_HOST, Defaults, Profile};
use crate::error::CliError;
use crate::output;

use super::util::confirm;

const SETTABLE_KEYS: &str =
    "host, port, cache, cache_dir, backup_dir, identity_ttl_secs, live_ttl_secs, timeout";

// ── Helpers ─────────────────────────────────────────────────────────

fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "cache = {}", cfg.defaults.cache);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        let _ = writeln!(out, "port = {}", p.port);
        if let Some(cache) = p.cache {
            let _ = writeln!(out, "cache = {cache}");
        }
        if let Some(ref dir) = p.cache_dir {
            let _ = writeln!(out, "cache_dir = \"{}\"", dir.display());
        }
        if let Some(ref dir) = p.backup_dir {
            let _ = writeln!(out, "backup_dir = \"{}\"", dir.display());
        }
        if let Some(ttl) = p.identity_ttl_secs {
            let _ = writeln!(out, "identity_ttl_secs = {ttl}");
        }
        if let Some(ttl) = p.live_ttl_secs {
            let _ = writeln!(out, "live_ttl_secs = {ttl}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out.trim_end().to_owned()
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

/// Apply one `config set` key to a profile.
fn apply_setting(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "host" => {
            if value.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "host".into(),
                    reason: "cannot be empty".into(),
                });
            }
            profile.host = value.trim().to_owned();
        }
        "port" => profile.port = parse("port", value, "a port number (1-65535)")?,
        "cache" => profile.cache = Some(parse("cache", value, "'true' or 'false'")?),
        "cache_dir" => profile.cache_dir = Some(value.into()),
        "backup_dir" => profile.backup_dir = Some(value.into()),
        "identity_ttl_secs" => {
            profile.identity_ttl_secs =
                Some(parse("identity_ttl_secs", value, "a number (seconds)")?);
        }
        "live_ttl_secs" => {
            profile.live_ttl_secs = Some(parse("live_ttl_secs", value, "a number (seconds)")?);
        }
        "timeout" => {
            let secs: u64 = parse("timeout", value, "a number (seconds)")?;
            if secs == 0 {
                return Err(CliError::Validation {
                    field: "timeout".into(),
                    reason: "must be at least 1 second".into(),
                });
            }
            profile.timeout = Some(secs);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
            });
        }
    }
    Ok(())
}

fn init(config_path: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    eprintln!("Airzone CLI configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    if config_path.exists()
        && !confirm("A config file already exists. Overwrite it?", global.yes)?
    {
        eprintln!("Aborted, existing config left untouched");
        return Ok(());
    }

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let host: String = Input::new()
        .with_prompt("Webserver IP address or hostname")
        .default(DEFAULT_HOST.into())
        .interact_text()
        .map_err(prompt_err)?;

    let port: u16 = Input::new()
        .with_prompt("Webserver port")
        .default(Profile::default().port)
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile {
        port,
        ..Profile::default()
    };
    apply_setting(&mut profile, "host", &host)?;

    let mut profiles = HashMap::new();
    profiles.insert(profile_name.clone(), profile);
    let cfg = Config {
        default_profile: Some(profile_name.clone()),
        defaults: Defaults::default(),
        profiles,
    };
    save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: airzone check");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(&config::config_path(), global),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            apply_setting(profile, &key, &value)?;

            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: airzone config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config::available_profiles(&cfg),
                });
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_parses_typed_keys() {
        let mut profile = Profile::default();
        apply_setting(&mut profile, "port", "3001").unwrap_or_else(|e| panic!("{e}"));
        apply_setting(&mut profile, "live-ttl-secs", "5").unwrap_or_else(|e| panic!("{e}"));
        apply_setting(&mut profile, "cache", "false").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(profile.port, 3001);
        assert_eq!(profile.live_ttl_secs, Some(5));
        assert_eq!(profile.cache, Some(false));
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut profile = Profile::default();
        assert!(matches!(
            apply_setting(&mut profile, "port", "70000"),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            apply_setting(&mut profile, "timeout", "0"),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            apply_setting(&mut profile, "host", "  "),
            Err(CliError::Validation { .. })
        ));
        let Err(CliError::Validation { reason, .. }) =
            apply_setting(&mut profile, "password", "x")
        else {
            panic!("expected unknown key error");
        };
        assert!(reason.contains("Valid keys"));
    }

    #[test]
    fn show_lists_profiles_in_order() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "upstairs".into(),
            Profile {
                host: "10.0.0.6".into(),
                ..Profile::default()
            },
        );
        cfg.profiles.insert("attic".into(), Profile::default());
        let text = format_config(&cfg);
        let attic = text.find("[profiles.attic]");
        let upstairs = text.find("[profiles.upstairs]");
        assert!(attic.is_some() && attic < upstairs);
        assert!(text.contains("host = \"10.0.0.6\""));
    }
}
