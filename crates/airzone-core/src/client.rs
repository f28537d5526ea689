// ── Cached Airzone client ──
//
// Composes a `Transport` with an optional `CacheStore`. Reads go through
// the cache unless forced; writes always go live and then invalidate
// every key whose cached value they could have made stale. Cache
// failures are logged and otherwise ignored.

use airzone_api::{ALL, ALL_SYSTEMS, ApiRequest, Endpoint, HttpTransport, Transport, TransportConfig};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheStore, TtlPolicy};
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::model::{self, SensorState, SensorUpdate, SystemState, ZoneState, ZoneUpdate};

/// Cache-aware client for one webserver.
pub struct Client<T: Transport> {
    transport: T,
    cache: Option<CacheStore>,
    ttl: TtlPolicy,
}

impl Client<HttpTransport> {
    /// Build an HTTP client from resolved configuration.
    ///
    /// An unusable cache directory disables caching rather than failing.
    pub fn from_config(config: &ClientConfig) -> Result<Self, CoreError> {
        let transport = HttpTransport::new(
            &config.host,
            config.port,
            &TransportConfig {
                timeout: config.timeout,
                ..TransportConfig::default()
            },
        )?;

        let cache = if config.cache.enabled {
            match CacheStore::open(&config.cache.dir) {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!(error = %e, "cache unavailable, continuing without it");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self::new(transport, cache, config.cache.ttl))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, cache: Option<CacheStore>, ttl: TtlPolicy) -> Self {
        Self {
            transport,
            cache,
            ttl,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }

    pub fn host(&self) -> &str {
        self.transport.host()
    }

    pub fn port(&self) -> u16 {
        self.transport.port()
    }

    pub fn cache_key(&self, request: &ApiRequest) -> CacheKey {
        CacheKey::for_request(self.host(), self.port(), request)
    }

    // ── Generic operations ───────────────────────────────────────────

    /// Read through the cache.
    ///
    /// With `force_refresh` the cached value is skipped but the fresh
    /// response still replaces it.
    pub async fn fetch(&self, request: &ApiRequest, force_refresh: bool) -> Result<Value, CoreError> {
        if request.method.is_write() {
            return Err(CoreError::Internal(format!(
                "fetch called with a {} request",
                request.method
            )));
        }

        let key = self.cache_key(request);
        if !force_refresh {
            if let Some(value) = self.cache.as_ref().and_then(|c| c.get(&key)) {
                return Ok(value);
            }
        }

        debug!(%key, force_refresh, "live fetch");
        let response = self.transport.request(request).await?;

        if let Some(cache) = &self.cache {
            let ttl = self.ttl.for_endpoint(request.endpoint);
            if let Err(e) = cache.set(&key, &response.body, ttl) {
                warn!(%key, error = %e, "cache write failed, continuing uncached");
            }
        }
        Ok(response.body)
    }

    /// Send a write and invalidate everything it may have made stale.
    pub async fn write(&self, request: &ApiRequest) -> Result<Value, CoreError> {
        let response = self.transport.request(request).await?;
        self.invalidate_affected(request);
        Ok(response.body)
    }

    /// Drop one cached read, or every cached response when `request` is
    /// `None`. Returns the number of entries removed.
    pub fn invalidate_cache(&self, request: Option<&ApiRequest>) -> Result<usize, CoreError> {
        let Some(cache) = &self.cache else {
            return Ok(0);
        };
        match request {
            Some(request) => Ok(usize::from(cache.invalidate(&self.cache_key(request))?)),
            None => Ok(cache.invalidate_all()?),
        }
    }

    fn invalidate_affected(&self, request: &ApiRequest) {
        let Some(cache) = &self.cache else {
            return;
        };
        for read in affected_reads(request) {
            let key = self.cache_key(&read);
            if let Err(e) = cache.invalidate(&key) {
                warn!(%key, error = %e, "cache invalidation failed");
            }
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub async fn version(&self, force_refresh: bool) -> Result<Value, CoreError> {
        self.fetch(&ApiRequest::version(), force_refresh).await
    }

    pub async fn webserver(&self, force_refresh: bool) -> Result<Value, CoreError> {
        self.fetch(&ApiRequest::webserver(), force_refresh).await
    }

    // ── Systems ──────────────────────────────────────────────────────

    pub async fn systems(&self, force_refresh: bool) -> Result<Vec<SystemState>, CoreError> {
        let body = self.fetch(&ApiRequest::all_systems(), force_refresh).await?;
        model::parse_entities(&body, "systems", &[])
    }

    pub async fn system(&self, system_id: u32, force_refresh: bool) -> Result<SystemState, CoreError> {
        let body = self.fetch(&ApiRequest::system(system_id), force_refresh).await?;
        model::parse_entities(&body, "system", &[("systemID", system_id)])?
            .into_iter()
            .next()
            .ok_or_else(|| not_found("system", system_id.to_string()))
    }

    // ── Zones ────────────────────────────────────────────────────────

    /// Every zone of every system.
    pub async fn all_zones(&self, force_refresh: bool) -> Result<Vec<ZoneState>, CoreError> {
        let body = self.fetch(&ApiRequest::all_zones(), force_refresh).await?;
        model::parse_entities(&body, "zones", &[])
    }

    pub async fn zones(&self, system_id: u32, force_refresh: bool) -> Result<Vec<ZoneState>, CoreError> {
        let body = self.fetch(&ApiRequest::zones(system_id), force_refresh).await?;
        model::parse_entities(&body, "zones", &[("systemID", system_id)])
    }

    pub async fn zone(
        &self,
        system_id: u32,
        zone_id: u32,
        force_refresh: bool,
    ) -> Result<ZoneState, CoreError> {
        let body = self
            .fetch(&ApiRequest::zone(system_id, zone_id), force_refresh)
            .await?;
        model::parse_entities::<ZoneState>(
            &body,
            "zone",
            &[("systemID", system_id), ("zoneID", zone_id)],
        )?
        .into_iter()
        .find(|z| z.zone_id == zone_id)
        .ok_or_else(|| not_found("zone", format!("{system_id}/{zone_id}")))
    }

    pub async fn set_zone(
        &self,
        system_id: u32,
        zone_id: u32,
        update: &ZoneUpdate,
    ) -> Result<Value, CoreError> {
        update.validate()?;
        check_target("zone", system_id, zone_id)?;
        self.write(&ApiRequest::set_zone(system_id, zone_id, update.to_params()))
            .await
    }

    // ── IAQ sensors ──────────────────────────────────────────────────

    pub async fn sensors(&self, system_id: u32, force_refresh: bool) -> Result<Vec<SensorState>, CoreError> {
        let body = self
            .fetch(&ApiRequest::iaq_sensors(system_id), force_refresh)
            .await?;
        model::parse_entities(&body, "iaq sensors", &[("systemID", system_id)])
    }

    pub async fn sensor(
        &self,
        system_id: u32,
        sensor_id: u32,
        force_refresh: bool,
    ) -> Result<SensorState, CoreError> {
        let body = self
            .fetch(&ApiRequest::iaq_sensor(system_id, sensor_id), force_refresh)
            .await?;
        model::parse_entities::<SensorState>(
            &body,
            "iaq sensor",
            &[("systemID", system_id)],
        )?
        .into_iter()
        .find(|s| s.sensor_id == sensor_id)
        .ok_or_else(|| not_found("IAQ sensor", format!("{system_id}/{sensor_id}")))
    }

    pub async fn set_sensor(
        &self,
        system_id: u32,
        sensor_id: u32,
        update: &SensorUpdate,
    ) -> Result<Value, CoreError> {
        update.validate()?;
        check_target("IAQ sensor", system_id, sensor_id)?;
        self.write(&ApiRequest::set_iaq_sensor(
            system_id,
            sensor_id,
            update.to_params(),
        ))
        .await
    }
}

/// Reads whose cached value a write can invalidate: the entity itself,
/// its system's listings, and the device-wide aggregates. Zones and IAQ
/// sensors share an identifier space, so both families are dropped.
fn affected_reads(write: &ApiRequest) -> Vec<ApiRequest> {
    let mut reads = vec![ApiRequest::all_systems(), ApiRequest::all_zones()];
    let Some(system_id) = write.system_id() else {
        return reads;
    };
    reads.push(ApiRequest::system(system_id));
    reads.push(ApiRequest::zones(system_id));
    reads.push(ApiRequest::iaq_sensors(system_id));

    let entity_id = match write.endpoint {
        Endpoint::Iaq => write.sensor_id(),
        _ => write.zone_id(),
    };
    if let Some(id) = entity_id.filter(|id| *id != ALL) {
        reads.push(ApiRequest::zone(system_id, id));
        reads.push(ApiRequest::iaq_sensor(system_id, id));
    }
    reads
}

fn check_target(entity: &str, system_id: u32, id: u32) -> Result<(), CoreError> {
    if system_id == ALL || system_id == ALL_SYSTEMS {
        return Err(CoreError::invalid(
            "system",
            format!("{system_id} is a broadcast selector, not a {entity} owner"),
        ));
    }
    if id == ALL {
        return Err(CoreError::invalid(
            entity,
            "0 addresses every entity; pick one",
        ));
    }
    Ok(())
}

fn not_found(entity_type: &str, identifier: String) -> CoreError {
    CoreError::NotFound {
        entity_type: entity_type.into(),
        identifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_write_touches_entity_and_aggregates() {
        let write = ApiRequest::set_zone(2, 3, serde_json::Map::new());
        let reads = affected_reads(&write);

        for expected in [
            ApiRequest::zone(2, 3),
            ApiRequest::zones(2),
            ApiRequest::system(2),
            ApiRequest::all_systems(),
            ApiRequest::all_zones(),
            ApiRequest::iaq_sensor(2, 3),
        ] {
            assert!(reads.contains(&expected), "missing {expected:?}");
        }
        assert!(!reads.contains(&ApiRequest::zone(1, 3)));
    }

    #[test]
    fn broadcast_targets_are_rejected() {
        assert!(check_target("zone", 127, 1).is_err());
        assert!(check_target("zone", 1, 0).is_err());
        assert!(check_target("zone", 1, 1).is_ok());
    }
}
