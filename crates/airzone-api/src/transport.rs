// Transport seam between the client layer and the webserver.
//
// `Transport` is the single request/response exchange the rest of the
// workspace depends on. `HttpTransport` is the real implementation;
// tests in downstream crates script their own.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::Error;
use crate::request::ApiRequest;

/// A decoded webserver response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

/// One request/response exchange against an Airzone webserver.
///
/// Implementations must not retry or cache; both are decided by callers.
pub trait Transport: Send + Sync {
    /// Hostname or IP the transport talks to (part of cache identity).
    fn host(&self) -> &str;

    /// TCP port the transport talks to (part of cache identity).
    fn port(&self) -> u16;

    /// Execute a request and return the decoded body.
    fn request(&self, request: &ApiRequest)
    -> impl Future<Output = Result<Response, Error>> + Send;
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("airzone/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;
        Ok(client)
    }
}
