// ── On-disk cache store ──
//
// One JSON file per key under the cache directory. Reads are lock-free;
// every mutation holds an exclusive advisory lock on `<dir>/.lock` for
// its duration and publishes entries by write-to-temp + rename, so a
// reader sees either the old entry or the new one, never a torn write.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::key::CacheKey;
use crate::error::CacheError;

const LOCK_FILE: &str = ".lock";
const ENTRY_EXTENSION: &str = "json";

/// A cached response, exactly as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub stored_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Fresh iff `now < stored_at + ttl`. A zero TTL is never fresh.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let age_ms = now.signed_duration_since(self.stored_at).num_milliseconds();
        i128::from(age_ms) < i128::from(self.ttl_secs) * 1000
    }
}

/// Persistent response cache shared by every invocation on this host.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

/// Exclusive hold on the store. Released on drop, whatever the exit path.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(error = %e, "cache unlock failed; lock is released on close");
        }
    }
}

impl CacheStore {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The cached value for `key`, if present and fresh.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.get_at(key, Utc::now())
    }

    /// [`get`](Self::get) against an explicit clock.
    pub fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Value> {
        let path = self.entry_path(key);
        let entry = read_entry(&path)?;

        if entry.key != key.as_str() {
            warn!(path = %path.display(), "cache entry key mismatch, ignoring");
            return None;
        }

        if entry.is_fresh_at(now) {
            debug!(%key, "cache hit");
            return Some(entry.value);
        }

        debug!(%key, "cache entry expired");
        self.remove_expired(key, now);
        None
    }

    /// Every readable entry, fresh or not.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let mut entries: Vec<CacheEntry> = self
            .entry_paths()?
            .iter()
            .filter_map(|path| read_entry(path))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: &CacheKey, value: &Value, ttl: Duration) -> Result<(), CacheError> {
        self.set_at(key, value, ttl, Utc::now())
    }

    /// [`set`](Self::set) against an explicit clock.
    pub fn set_at(
        &self,
        key: &CacheKey,
        value: &Value,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            key: key.as_str().to_owned(),
            value: value.clone(),
            stored_at: now,
            ttl_secs: ttl.as_secs(),
        };

        let _lock = self.lock()?;
        self.write_entry(&self.entry_path(key), &entry)?;
        debug!(%key, ttl_secs = entry.ttl_secs, "cache store");
        Ok(())
    }

    /// Remove the entry for `key`. Returns whether anything was removed.
    pub fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let _lock = self.lock()?;
        let removed = remove_file_if_exists(&self.entry_path(key))?;
        if removed {
            debug!(%key, "cache invalidate");
        }
        Ok(removed)
    }

    /// Remove every entry. Returns how many were removed.
    pub fn invalidate_all(&self) -> Result<usize, CacheError> {
        let _lock = self.lock()?;
        let mut removed = 0;
        for path in self.entry_paths()? {
            if remove_file_if_exists(&path)? {
                removed += 1;
            }
        }
        debug!(removed, "cache cleared");
        Ok(removed)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn entry_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };
        Ok(read_dir
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == ENTRY_EXTENSION))
            .collect())
    }

    fn lock(&self) -> Result<StoreLock, CacheError> {
        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| CacheError::Lock {
                path: path.clone(),
                source,
            })?;
        FileExt::lock_exclusive(&file).map_err(|source| CacheError::Lock { path, source })?;
        Ok(StoreLock { file })
    }

    fn write_entry(&self, path: &Path, entry: &CacheEntry) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        let tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, entry)?;
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Lazy eviction. Re-checks under the lock so a concurrent refresh
    /// is never thrown away.
    fn remove_expired(&self, key: &CacheKey, now: DateTime<Utc>) {
        let result = self.lock().and_then(|_lock| {
            let path = self.entry_path(key);
            match read_entry(&path) {
                Some(entry) if entry.is_fresh_at(now) => Ok(false),
                _ => remove_file_if_exists(&path),
            }
        });
        if let Err(e) = result {
            debug!(%key, error = %e, "lazy cache eviction failed");
        }
    }
}

/// Read and decode one entry. Missing files are silent misses, corrupt
/// ones are logged misses.
fn read_entry(path: &Path) -> Option<CacheEntry> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable cache entry");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt cache entry");
            None
        }
    }
}

fn remove_file_if_exists(path: &Path) -> Result<bool, CacheError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
