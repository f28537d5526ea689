// airzone-api: Async client for the Airzone local webserver API (`/api/v1`)

pub mod error;
pub mod http;
pub mod request;
pub mod transport;

pub use error::Error;
pub use http::HttpTransport;
pub use request::{ALL, ALL_SYSTEMS, ApiRequest, Endpoint, Method};
pub use transport::{Response, Transport, TransportConfig};
