// HTTP transport for the Airzone webserver
//
// Wraps `reqwest::Client` with `/api/v1/{endpoint}` URL construction and
// the webserver's error conventions: non-2xx statuses carry a raw body,
// and some failures come back as 2xx with only an `errors` array.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::request::{ApiRequest, Method};
use crate::transport::{Response, Transport, TransportConfig};

/// Raw HTTP client for one Airzone webserver.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    host: String,
    port: u16,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for `http://{host}:{port}`.
    pub fn new(host: &str, port: u16, config: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{host}:{port}/"))?;
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            host: host.to_owned(),
            port,
            timeout: config.timeout,
        })
    }

    /// Create a transport with a pre-built `reqwest::Client`.
    ///
    /// `base_url` is the webserver root, e.g. `http://192.168.1.100:3000`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        let host = base_url.host_str().unwrap_or_default().to_owned();
        let port = base_url.port_or_known_default().unwrap_or(80);
        Self {
            http,
            base_url,
            host,
            port,
            timeout: TransportConfig::default().timeout,
        }
    }

    /// The webserver root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/v1/{endpoint}`
    fn endpoint_url(&self, request: &ApiRequest) -> Result<Url, Error> {
        Ok(self
            .base_url
            .join(&format!("api/v1/{}", request.endpoint))?)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn parse_response(&self, resp: reqwest::Response) -> Result<Response, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        trace!(status = status.as_u16(), %body, "raw response");

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?
        };

        if let Some(errors) = reported_errors(&value) {
            return Err(Error::Reported { errors });
        }

        Ok(Response {
            status: status.as_u16(),
            body: value,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

impl Transport for HttpTransport {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    async fn request(&self, request: &ApiRequest) -> Result<Response, Error> {
        let url = self.endpoint_url(request)?;
        debug!(method = %request.method, %url, params = %request.body(), "sending request");

        let builder = match request.method {
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
        };

        let resp = builder
            .json(&request.body())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.parse_response(resp).await
    }
}

/// A 2xx body that carries `errors` but no payload is a device-side failure.
fn reported_errors(body: &Value) -> Option<Vec<Value>> {
    let obj = body.as_object()?;
    if obj.contains_key("data") || obj.contains_key("systems") {
        return None;
    }
    match obj.get("errors") {
        Some(Value::Array(errors)) if !errors.is_empty() => Some(errors.clone()),
        _ => None,
    }
}
