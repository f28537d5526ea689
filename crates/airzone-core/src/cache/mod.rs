// ── Response cache ──
//
// Persistent, cross-process cache of webserver responses. Keys are
// derived from request identity, TTLs from the endpoint class.

mod key;
mod store;

use std::time::Duration;

use airzone_api::Endpoint;

use crate::error::CoreError;

pub use key::CacheKey;
pub use store::{CacheEntry, CacheStore};

/// How volatile an endpoint's data is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// Firmware version, MAC, alias: changes on upgrade or re-provisioning.
    Identity,
    /// Power, setpoints, temperatures, air quality.
    LiveStatus,
}

impl EndpointClass {
    pub fn of(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Version | Endpoint::Webserver => Self::Identity,
            Endpoint::Hvac | Endpoint::Iaq => Self::LiveStatus,
        }
    }
}

/// TTL per endpoint class. Identity data always lives at least as long
/// as live status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    identity: Duration,
    live: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            identity: Duration::from_secs(3600),
            live: Duration::from_secs(10),
        }
    }
}

impl TtlPolicy {
    pub fn new(identity: Duration, live: Duration) -> Result<Self, CoreError> {
        if identity < live {
            return Err(CoreError::invalid(
                "cache ttl",
                format!(
                    "identity TTL ({}s) must not be shorter than live TTL ({}s)",
                    identity.as_secs(),
                    live.as_secs()
                ),
            ));
        }
        Ok(Self { identity, live })
    }

    pub fn identity(&self) -> Duration {
        self.identity
    }

    pub fn live(&self) -> Duration {
        self.live
    }

    pub fn for_class(&self, class: EndpointClass) -> Duration {
        match class {
            EndpointClass::Identity => self.identity,
            EndpointClass::LiveStatus => self.live,
        }
    }

    pub fn for_endpoint(&self, endpoint: Endpoint) -> Duration {
        self.for_class(EndpointClass::of(endpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_orders_classes() {
        let policy = TtlPolicy::default();
        assert!(policy.for_endpoint(Endpoint::Version) > policy.for_endpoint(Endpoint::Hvac));
        assert_eq!(
            policy.for_endpoint(Endpoint::Iaq),
            policy.for_class(EndpointClass::LiveStatus)
        );
    }

    #[test]
    fn rejects_inverted_policy() {
        let result = TtlPolicy::new(Duration::from_secs(5), Duration::from_secs(60));
        assert!(matches!(result, Err(CoreError::InvalidParameter { .. })));
        assert!(TtlPolicy::new(Duration::from_secs(60), Duration::from_secs(60)).is_ok());
    }
}
