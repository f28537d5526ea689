// ── Backup directory ──

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::snapshot::Snapshot;
use crate::error::CoreError;

/// Listing entry for one backup file.
///
/// Files that cannot be parsed are still listed with `readable == false`.
#[derive(Debug, Clone, Serialize)]
pub struct BackupSummary {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub host: Option<String>,
    pub alias: Option<String>,
    pub systems: Option<usize>,
    pub zones: Option<usize>,
    pub readable: bool,
}

/// A directory holding `*.json` backup files.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` as `name` atomically. Never overwrites an existing file.
    pub fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, CoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| CoreError::io(&self.dir, e))?;
        let path = self.dir.join(name);

        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| CoreError::io(&self.dir, e))?;
        tmp.write_all(bytes).map_err(|e| CoreError::io(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| CoreError::io(tmp.path(), e))?;
        tmp.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                CoreError::AlreadyExists { path: path.clone() }
            } else {
                CoreError::io(&path, e.error)
            }
        })?;

        debug!(path = %path.display(), bytes = bytes.len(), "backup written");
        Ok(path)
    }

    /// Serialize and save under the snapshot's suggested name.
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<PathBuf, CoreError> {
        let bytes = super::serialize(snapshot)?;
        self.save(&snapshot.suggested_name(), &bytes)
    }

    /// Every `*.json` file in the directory, newest first. A missing
    /// directory lists as empty.
    pub fn list(&self) -> Result<Vec<BackupSummary>, CoreError> {
        let dir = match fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::io(&self.dir, e)),
        };

        let mut out = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| CoreError::io(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") || !path.is_file() {
                continue;
            }
            out.push(summarize(&path));
        }

        out.sort_by(|a, b| {
            b.created_at
                .or(b.modified)
                .cmp(&a.created_at.or(a.modified))
                .then_with(|| b.name.cmp(&a.name))
        });
        Ok(out)
    }

    /// Resolve a bare file name against the directory; anything with a
    /// path separator, or an existing path, is taken as given.
    pub fn resolve(&self, name_or_path: &str) -> PathBuf {
        let given = Path::new(name_or_path);
        if given.components().count() > 1 || given.exists() {
            given.to_path_buf()
        } else {
            self.dir.join(given)
        }
    }

    pub fn load(&self, name_or_path: &str) -> Result<Vec<u8>, CoreError> {
        let path = self.resolve(name_or_path);
        fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound {
                entity_type: "backup".into(),
                identifier: path.display().to_string(),
            },
            _ => CoreError::io(&path, e),
        })
    }
}

fn summarize(path: &Path) -> BackupSummary {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let meta = fs::metadata(path).ok();
    let mut summary = BackupSummary {
        name,
        path: path.to_path_buf(),
        size_bytes: meta.as_ref().map_or(0, fs::Metadata::len),
        modified: meta
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from),
        created_at: None,
        host: None,
        alias: None,
        systems: None,
        zones: None,
        readable: false,
    };

    let doc = match fs::read(path).map(|b| serde_json::from_slice::<Value>(&b)) {
        Ok(Ok(doc)) => doc,
        Ok(Err(e)) => {
            warn!(path = %path.display(), error = %e, "unreadable backup");
            return summary;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read backup");
            return summary;
        }
    };

    summary.readable = doc.is_object();
    summary.created_at = doc
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));
    summary.host = doc
        .pointer("/device/host")
        .and_then(Value::as_str)
        .map(str::to_owned);
    summary.alias = doc
        .pointer("/device/alias")
        .and_then(Value::as_str)
        .map(str::to_owned);
    summary.systems = doc.get("systems").and_then(Value::as_array).map(Vec::len);
    summary.zones = doc.get("zones").and_then(Value::as_array).map(Vec::len);
    summary
}
