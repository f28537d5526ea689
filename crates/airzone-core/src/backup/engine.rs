// ── Snapshot capture ──
//
// Every read is forced past the cache. Phases run in order (identity,
// systems, zones, sensors); within a phase per-system reads may overlap
// up to `concurrency`, with results kept in system order. The first
// failure aborts the capture. A live capture for comparison reads sensors
// only for the systems that had sensors in the snapshot.

use std::collections::BTreeSet;

use airzone_api::Transport;
use chrono::Utc;
use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use super::diff::{DiffResult, DiffScope, diff};
use super::snapshot::{DeviceIdentity, Snapshot};
use crate::client::Client;
use crate::error::CoreError;
use crate::model::{SensorState, SystemState, ZoneState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupOptions {
    /// Maximum in-flight per-system reads. `1` is fully sequential.
    pub concurrency: usize,
    /// Capture IAQ sensors. Disable for webservers without an `iaq` endpoint.
    pub include_sensors: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            include_sensors: true,
        }
    }
}

/// Which systems the sensor phase reads.
enum SensorPhase {
    Skip,
    AllSystems,
    Systems(BTreeSet<u32>),
}

/// Captures snapshots from, and compares snapshots against, a live device.
pub struct BackupEngine<'a, T: Transport> {
    client: &'a Client<T>,
    options: BackupOptions,
}

impl<'a, T: Transport> BackupEngine<'a, T> {
    pub fn new(client: &'a Client<T>) -> Self {
        Self::with_options(client, BackupOptions::default())
    }

    pub fn with_options(client: &'a Client<T>, options: BackupOptions) -> Self {
        Self { client, options }
    }

    /// Capture a complete snapshot and its suggested file name.
    ///
    /// Nothing is written anywhere; persisting is the caller's call.
    pub async fn create_snapshot(&self) -> Result<(Snapshot, String), CoreError> {
        let sensors = if self.options.include_sensors {
            SensorPhase::AllSystems
        } else {
            SensorPhase::Skip
        };
        let snapshot = self.capture(sensors).await?;
        info!(
            systems = snapshot.systems().len(),
            zones = snapshot.zones().len(),
            sensors = snapshot.sensors().len(),
            "snapshot captured"
        );
        let name = snapshot.suggested_name();
        Ok((snapshot, name))
    }

    /// Compare a snapshot with the device's current state. Read-only.
    ///
    /// Sensors are read live only for systems that have sensors in the
    /// snapshot, so a backup taken without sensors compares zones only.
    pub async fn diff_against_live(
        &self,
        snapshot: &Snapshot,
        scope: DiffScope,
    ) -> Result<DiffResult, CoreError> {
        let sensor_systems: BTreeSet<u32> =
            snapshot.sensors().iter().map(|s| s.system_id).collect();
        let sensors = if sensor_systems.is_empty() {
            SensorPhase::Skip
        } else {
            SensorPhase::Systems(sensor_systems)
        };
        let live = self.capture(sensors).await?;
        Ok(diff(snapshot, &live, scope))
    }

    async fn capture(&self, sensors: SensorPhase) -> Result<Snapshot, CoreError> {
        let created_at = Utc::now();
        let client = self.client;

        let webserver = client
            .webserver(true)
            .await
            .map_err(|e| CoreError::partial("webserver", e))?;
        let version = client
            .version(true)
            .await
            .map_err(|e| CoreError::partial("version", e))?;
        let device = DeviceIdentity::from_payloads(client.host(), client.port(), &webserver, &version)
            .map_err(|e| CoreError::partial("webserver", e))?;

        let systems: Vec<SystemState> = client
            .systems(true)
            .await
            .map_err(|e| CoreError::partial("systems", e))?;
        let ids: Vec<u32> = systems.iter().map(|s| s.system_id).collect();
        debug!(?ids, "capturing systems");

        let zones: Vec<ZoneState> = self
            .per_system(&ids, move |id| async move {
                client
                    .zones(id, true)
                    .await
                    .map_err(|e| CoreError::partial(format!("zones of system {id}"), e))
            })
            .await?;

        let sensor_ids: Vec<u32> = match sensors {
            SensorPhase::Skip => Vec::new(),
            SensorPhase::AllSystems => ids.clone(),
            // Systems gone from the device show up as snapshot-only instead.
            SensorPhase::Systems(wanted) => {
                ids.iter().copied().filter(|id| wanted.contains(id)).collect()
            }
        };
        let sensors: Vec<SensorState> = if sensor_ids.is_empty() {
            Vec::new()
        } else {
            self.per_system(&sensor_ids, move |id| async move {
                client
                    .sensors(id, true)
                    .await
                    .map_err(|e| CoreError::partial(format!("IAQ sensors of system {id}"), e))
            })
            .await?
        };

        Ok(Snapshot::new(created_at, device, systems, zones, sensors))
    }

    /// Run `fetch` for every system with bounded concurrency, flattening
    /// the results in system order.
    async fn per_system<F, Fut, E>(&self, ids: &[u32], fetch: F) -> Result<Vec<E>, CoreError>
    where
        F: Fn(u32) -> Fut,
        Fut: Future<Output = Result<Vec<E>, CoreError>>,
    {
        let batches: Vec<Vec<E>> = stream::iter(ids.iter().copied())
            .map(fetch)
            .buffered(self.options.concurrency.max(1))
            .try_collect()
            .await?;
        Ok(batches.into_iter().flatten().collect())
    }
}
