// ── Cache key derivation ──

use std::collections::BTreeMap;
use std::fmt;

use airzone_api::{ApiRequest, Endpoint};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Identity of one logical read: host, port, endpoint, and parameters.
///
/// Parameters are sorted before rendering, so two requests that differ
/// only in parameter order share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(host: &str, port: u16, endpoint: Endpoint, params: &Map<String, Value>) -> Self {
        let sorted: BTreeMap<&str, String> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.to_string()))
            .collect();
        let query = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        Self(format!(
            "{}:{port}/{endpoint}?{query}",
            host.trim().to_ascii_lowercase()
        ))
    }

    pub fn for_request(host: &str, port: u16, request: &ApiRequest) -> Self {
        Self::new(host, port, request.endpoint, &request.params)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Entry file name: hex SHA-256 of the key, so any key is a safe path.
    pub fn file_name(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        format!("{}.json", hex::encode(digest))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let a = CacheKey::new(
            "10.0.0.5",
            3000,
            Endpoint::Hvac,
            &params(&[("systemID", json!(1)), ("zoneID", json!(2))]),
        );
        let b = CacheKey::new(
            "10.0.0.5",
            3000,
            Endpoint::Hvac,
            &params(&[("zoneID", json!(2)), ("systemID", json!(1))]),
        );
        assert_eq!(a, b);
        assert_eq!(a.file_name(), b.file_name());
    }

    #[test]
    fn distinct_requests_never_collide() {
        let zone = CacheKey::for_request("h", 3000, &ApiRequest::zone(1, 2));
        let keys = [
            zone.clone(),
            CacheKey::for_request("h", 3000, &ApiRequest::zone(2, 1)),
            CacheKey::for_request("h", 3000, &ApiRequest::iaq_sensor(1, 2)),
            CacheKey::for_request("h", 3001, &ApiRequest::zone(1, 2)),
            CacheKey::for_request("other", 3000, &ApiRequest::zone(1, 2)),
            CacheKey::for_request("h", 3000, &ApiRequest::zones(1)),
            CacheKey::for_request("h", 3000, &ApiRequest::system(1)),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
                assert_ne!(a.file_name(), b.file_name());
            }
        }
        assert_eq!(zone.as_str(), "h:3000/hvac?systemID=1&zoneID=2");
    }

    #[test]
    fn host_is_case_insensitive() {
        let a = CacheKey::for_request("Airzone.LAN", 3000, &ApiRequest::version());
        let b = CacheKey::for_request("airzone.lan", 3000, &ApiRequest::version());
        assert_eq!(a, b);
    }
}
