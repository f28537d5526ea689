//! `airzone cache`: inspect or clear the on-disk response cache.

use std::time::Duration;

use airzone_core::{CacheEntry, CacheStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct EntryView {
    key: String,
    stored_at: DateTime<Utc>,
    age_secs: u64,
    ttl_secs: u64,
    fresh: bool,
}

impl EntryView {
    fn new(entry: &CacheEntry, now: DateTime<Utc>) -> Self {
        let age = (now - entry.stored_at).to_std().unwrap_or(Duration::ZERO);
        Self {
            key: entry.key.clone(),
            stored_at: entry.stored_at,
            age_secs: age.as_secs(),
            ttl_secs: entry.ttl_secs,
            fresh: entry.is_fresh_at(now),
        }
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "TTL")]
    ttl: String,
    #[tabled(rename = "Fresh")]
    fresh: &'static str,
}

impl From<&EntryView> for EntryRow {
    fn from(v: &EntryView) -> Self {
        Self {
            key: v.key.clone(),
            age: humantime::format_duration(Duration::from_secs(v.age_secs)).to_string(),
            ttl: humantime::format_duration(Duration::from_secs(v.ttl_secs)).to_string(),
            fresh: if v.fresh { "yes" } else { "expired" },
        }
    }
}

pub fn handle(args: &CacheArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let settings = config::resolve_client_config(global, cfg)?.cache;
    let store = CacheStore::open(&settings.dir).map_err(airzone_core::CoreError::from)?;

    match args.command {
        CacheCommand::Status => {
            let now = Utc::now();
            let views: Vec<EntryView> = store
                .entries()
                .map_err(airzone_core::CoreError::from)?
                .iter()
                .map(|e| EntryView::new(e, now))
                .collect();

            if matches!(global.output, OutputFormat::Table) && !global.quiet {
                let state = if settings.enabled { "enabled" } else { "disabled" };
                eprintln!(
                    "Cache {state} at {} (identity TTL {}, live TTL {})",
                    store.dir().display(),
                    humantime::format_duration(settings.ttl.identity()),
                    humantime::format_duration(settings.ttl.live()),
                );
            }
            if views.is_empty() && matches!(global.output, OutputFormat::Table) {
                output::print_output("No cached responses", global.quiet);
                return Ok(());
            }
            let out =
                output::render_list(&global.output, &views, |v| EntryRow::from(v), |v| v.key.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CacheCommand::Clear => {
            let removed = store
                .invalidate_all()
                .map_err(airzone_core::CoreError::from)?;
            if !global.quiet {
                eprintln!("Removed {removed} cached response(s)");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use serde_json::json;

    use super::*;

    #[test]
    fn view_reports_age_and_freshness() {
        let now = Utc::now();
        let entry = CacheEntry {
            key: "10.0.0.5:3000/hvac?systemID=1".into(),
            value: json!({}),
            stored_at: now - TimeDelta::seconds(15),
            ttl_secs: 10,
        };
        let view = EntryView::new(&entry, now);
        assert_eq!(view.age_secs, 15);
        assert!(!view.fresh);

        let row = EntryRow::from(&view);
        assert_eq!(row.age, "15s");
        assert_eq!(row.ttl, "10s");
        assert_eq!(row.fresh, "expired");
    }
}
