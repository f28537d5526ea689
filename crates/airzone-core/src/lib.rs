//! Domain layer between `airzone-api` and the `airzone` CLI.
//!
//! - **[`Client`]** composes a [`Transport`](airzone_api::Transport) with an
//!   optional on-disk [`CacheStore`]. Reads are cache-first unless forced;
//!   writes bypass the cache and eagerly invalidate every key they can make
//!   stale, including the "all systems" / "all zones" aggregates.
//!
//! - **[`CacheStore`]** persists one JSON file per request identity with a
//!   per-entry TTL. Mutations run under an exclusive file lock and land via
//!   write-then-rename, so concurrent invocations never observe half-written
//!   entries.
//!
//! - **[`backup`]** captures complete device snapshots, (de)serializes them
//!   with a schema version, validates them without panicking, and diffs them
//!   against live state. Restore is preview-only: the webserver has no bulk
//!   write-back.
//!
//! - **Domain model** ([`model`]) wraps the webserver's loosely typed
//!   payloads while preserving every field, and [`error_codes`] explains the
//!   error codes units report.

pub mod backup;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod error_codes;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backup::{
    BackupEngine, BackupOptions, BackupStore, BackupSummary, DiffResult, DiffScope, Snapshot,
    ValidationReport,
};
pub use cache::{CacheEntry, CacheKey, CacheStore, EndpointClass, TtlPolicy};
pub use client::Client;
pub use config::{CacheSettings, ClientConfig};
pub use error::{CacheError, CoreError};
pub use model::{
    AirQuality, Mode, SensorState, SensorUpdate, SystemState, Units, VentilationMode, ZoneState,
    ZoneUpdate,
};
