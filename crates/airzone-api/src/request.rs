// Request descriptors for the Airzone `/api/v1` surface.
//
// The webserver multiplexes everything over four endpoints. Reads are
// POSTs carrying a JSON selector body, writes are PUTs carrying the
// selector plus the parameters to change.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// `systemID` selector meaning "every system".
pub const ALL_SYSTEMS: u32 = 127;

/// `systemID` / `zoneID` / `iaqsensorid` selector meaning "every entity".
pub const ALL: u32 = 0;

/// The four endpoints exposed under `/api/v1/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Version,
    Webserver,
    Hvac,
    Iaq,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Webserver => "webserver",
            Self::Hvac => "hvac",
            Self::Iaq => "iaq",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Read (selector in body).
    Post,
    /// Write (selector + parameters in body).
    Put,
}

impl Method {
    pub fn is_write(self) -> bool {
        matches!(self, Self::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        })
    }
}

/// A single request against the webserver.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: Endpoint,
    pub params: Map<String, Value>,
}

impl ApiRequest {
    pub fn read(endpoint: Endpoint, params: Map<String, Value>) -> Self {
        Self {
            method: Method::Post,
            endpoint,
            params,
        }
    }

    pub fn write(endpoint: Endpoint, params: Map<String, Value>) -> Self {
        Self {
            method: Method::Put,
            endpoint,
            params,
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn version() -> Self {
        Self::read(Endpoint::Version, Map::new())
    }

    pub fn webserver() -> Self {
        Self::read(Endpoint::Webserver, Map::new())
    }

    // ── HVAC reads ───────────────────────────────────────────────────

    /// `hvac {systemID: 127}`
    pub fn all_systems() -> Self {
        Self::read(Endpoint::Hvac, selector(&[("systemID", ALL_SYSTEMS)]))
    }

    /// `hvac {systemID}`
    pub fn system(system_id: u32) -> Self {
        Self::read(Endpoint::Hvac, selector(&[("systemID", system_id)]))
    }

    /// `hvac {systemID: 0, zoneID: 0}`
    pub fn all_zones() -> Self {
        Self::zone(ALL, ALL)
    }

    /// `hvac {systemID, zoneID: 0}`
    pub fn zones(system_id: u32) -> Self {
        Self::zone(system_id, ALL)
    }

    /// `hvac {systemID, zoneID}`
    pub fn zone(system_id: u32, zone_id: u32) -> Self {
        Self::read(
            Endpoint::Hvac,
            selector(&[("systemID", system_id), ("zoneID", zone_id)]),
        )
    }

    // ── IAQ reads ────────────────────────────────────────────────────

    /// `iaq {systemID, iaqsensorid: 0}`
    pub fn iaq_sensors(system_id: u32) -> Self {
        Self::iaq_sensor(system_id, ALL)
    }

    /// `iaq {systemID, iaqsensorid}`
    pub fn iaq_sensor(system_id: u32, sensor_id: u32) -> Self {
        Self::read(
            Endpoint::Iaq,
            selector(&[("systemID", system_id), ("iaqsensorid", sensor_id)]),
        )
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// `PUT hvac {systemID, zoneID, ...params}`
    pub fn set_zone(system_id: u32, zone_id: u32, params: Map<String, Value>) -> Self {
        let mut body = selector(&[("systemID", system_id), ("zoneID", zone_id)]);
        body.extend(params);
        Self::write(Endpoint::Hvac, body)
    }

    /// `PUT iaq {systemID, iaqsensorid, ...params}`
    pub fn set_iaq_sensor(system_id: u32, sensor_id: u32, params: Map<String, Value>) -> Self {
        let mut body = selector(&[("systemID", system_id), ("iaqsensorid", sensor_id)]);
        body.extend(params);
        Self::write(Endpoint::Iaq, body)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn system_id(&self) -> Option<u32> {
        self.id_param("systemID")
    }

    pub fn zone_id(&self) -> Option<u32> {
        self.id_param("zoneID")
    }

    pub fn sensor_id(&self) -> Option<u32> {
        self.id_param("iaqsensorid")
    }

    fn id_param(&self, name: &str) -> Option<u32> {
        self.params
            .get(name)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }

    /// JSON body sent on the wire.
    pub fn body(&self) -> Value {
        Value::Object(self.params.clone())
    }
}

fn selector(ids: &[(&str, u32)]) -> Map<String, Value> {
    ids.iter()
        .map(|(name, id)| ((*name).to_owned(), json!(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_selectors_use_reserved_ids() {
        assert_eq!(ApiRequest::all_systems().body(), json!({"systemID": 127}));
        assert_eq!(
            ApiRequest::all_zones().body(),
            json!({"systemID": 0, "zoneID": 0})
        );
        assert_eq!(
            ApiRequest::iaq_sensors(2).body(),
            json!({"systemID": 2, "iaqsensorid": 0})
        );
    }

    #[test]
    fn writes_merge_selector_and_params() {
        let mut params = Map::new();
        params.insert("setpoint".into(), json!(22.5));
        let req = ApiRequest::set_zone(1, 3, params);

        assert_eq!(req.method, Method::Put);
        assert_eq!(req.endpoint, Endpoint::Hvac);
        assert_eq!(
            req.body(),
            json!({"systemID": 1, "zoneID": 3, "setpoint": 22.5})
        );
        assert_eq!(req.system_id(), Some(1));
        assert_eq!(req.zone_id(), Some(3));
        assert_eq!(req.sensor_id(), None);
    }
}
