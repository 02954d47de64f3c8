//! SIRI StopMonitoring adapter over HTTP.
//!
//! Queries a StopMonitoring endpoint (the 511.org transit API by default)
//! for the upcoming visits at one stop. The adapter only fetches; decoding
//! and parsing live in [`crate::payload`] so a raw body can be archived
//! before anything is interpreted.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stopmon_adapters::payload::{decode_body, parse_payload};
//! use stopmon_adapters::siri::StopMonitoringAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = StopMonitoringAdapter::builder()
//!         .api_key("your-511-key")
//!         .agency("SF")
//!         .stop_code("16633")
//!         .build()?;
//!
//!     let raw = adapter.fetch().await?;
//!     for visit in parse_payload(&decode_body(&raw)?) {
//!         println!("{} to {} at {}", visit.line, visit.destination, visit.arrival_utc);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Client;

use crate::AdapterError;

/// Default StopMonitoring endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.511.org/transit/StopMonitoring";

/// Default agency (San Francisco Muni).
pub const DEFAULT_AGENCY: &str = "SF";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Adapter for fetching stop monitoring data for a single stop.
#[derive(Clone)]
pub struct StopMonitoringAdapter {
    client: Client,
    endpoint: String,
    api_key: String,
    agency: String,
    stop_code: String,
    timeout: Duration,
}

impl StopMonitoringAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> StopMonitoringAdapterBuilder {
        StopMonitoringAdapterBuilder::default()
    }

    /// Fetch the raw response body for the configured stop.
    ///
    /// Any non-success status is an error; the body is returned untouched
    /// otherwise, byte-order mark and all.
    pub async fn fetch(&self) -> Result<Vec<u8>, AdapterError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query()[..])
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }

    /// The stop being monitored.
    pub fn stop_code(&self) -> &str {
        &self.stop_code
    }

    /// The agency the stop belongs to.
    pub fn agency(&self) -> &str {
        &self.agency
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The request URL with the API key redacted, for logging.
    pub fn redacted_url(&self) -> String {
        format!(
            "{}?api_key=***&agency={}&stopCode={}&format=json",
            self.endpoint, self.agency, self.stop_code
        )
    }

    fn query(&self) -> [(&'static str, &str); 4] {
        [
            ("api_key", self.api_key.as_str()),
            ("agency", self.agency.as_str()),
            ("stopCode", self.stop_code.as_str()),
            ("format", "json"),
        ]
    }
}

impl std::fmt::Debug for StopMonitoringAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopMonitoringAdapter")
            .field("endpoint", &self.endpoint)
            .field("agency", &self.agency)
            .field("stop_code", &self.stop_code)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for StopMonitoringAdapter.
#[derive(Debug, Default)]
pub struct StopMonitoringAdapterBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    agency: Option<String>,
    stop_code: Option<String>,
    timeout: Option<Duration>,
}

impl StopMonitoringAdapterBuilder {
    /// Set the StopMonitoring endpoint (default: the 511.org API).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API access credential. Required.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the agency code (default: "SF").
    pub fn agency(mut self, agency: impl Into<String>) -> Self {
        self.agency = Some(agency.into());
        self
    }

    /// Set the stop identifier. Required.
    pub fn stop_code(mut self, stop_code: impl Into<String>) -> Self {
        self.stop_code = Some(stop_code.into());
        self
    }

    /// Set the request timeout (default: 15 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the adapter.
    pub fn build(self) -> Result<StopMonitoringAdapter, AdapterError> {
        let api_key = required(self.api_key, "api key")?;
        let stop_code = required(self.stop_code, "stop code")?;
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(StopMonitoringAdapter {
            client,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key,
            agency: self.agency.unwrap_or_else(|| DEFAULT_AGENCY.to_string()),
            stop_code,
            timeout,
        })
    }
}

fn required(value: Option<String>, what: &str) -> Result<String, AdapterError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AdapterError::Config(format!("missing {}", what))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> StopMonitoringAdapter {
        StopMonitoringAdapter::builder()
            .api_key("secret-key")
            .stop_code("16633")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let adapter = adapter();
        assert_eq!(adapter.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(adapter.agency(), "SF");
        assert_eq!(adapter.stop_code(), "16633");
        assert_eq!(adapter.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_builder_custom() {
        let adapter = StopMonitoringAdapter::builder()
            .endpoint("http://localhost:8080/StopMonitoring")
            .api_key("k")
            .agency("AC")
            .stop_code("55555")
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();

        assert_eq!(adapter.endpoint, "http://localhost:8080/StopMonitoring");
        assert_eq!(adapter.agency(), "AC");
        assert_eq!(adapter.stop_code(), "55555");
        assert_eq!(adapter.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_builder_requires_api_key_and_stop() {
        let err = StopMonitoringAdapter::builder().stop_code("1").build().unwrap_err();
        assert!(err.to_string().contains("api key"));

        let err = StopMonitoringAdapter::builder()
            .api_key("k")
            .stop_code("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("stop code"));
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", adapter());
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("16633"));
    }

    #[test]
    fn test_query_parameters() {
        let adapter = adapter();
        assert_eq!(
            adapter.query(),
            [
                ("api_key", "secret-key"),
                ("agency", "SF"),
                ("stopCode", "16633"),
                ("format", "json"),
            ]
        );
    }

    #[test]
    fn test_redacted_url_hides_key() {
        let url = adapter().redacted_url();
        assert!(!url.contains("secret-key"));
        assert!(url.contains("stopCode=16633"));
        assert!(url.starts_with(DEFAULT_ENDPOINT));
    }

    /// Serve exactly one canned HTTP response on an ephemeral port.
    async fn serve_once(status: &str, body: &[u8]) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(&response).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/StopMonitoring", addr)
    }

    fn adapter_for(endpoint: String) -> StopMonitoringAdapter {
        StopMonitoringAdapter::builder()
            .endpoint(endpoint)
            .api_key("k")
            .stop_code("16633")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_raw_body() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice(br#"{"ServiceDelivery":{}}"#);
        let endpoint = serve_once("200 OK", &body).await;

        let raw = adapter_for(endpoint).fetch().await.unwrap();
        assert_eq!(raw, body);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let endpoint = serve_once("503 Service Unavailable", b"{}").await;

        let err = adapter_for(endpoint).fetch().await.unwrap_err();
        assert!(matches!(err, AdapterError::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = adapter_for(format!("http://{}/StopMonitoring", addr))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Connection(_) | AdapterError::Http(_)
        ));
    }
}
