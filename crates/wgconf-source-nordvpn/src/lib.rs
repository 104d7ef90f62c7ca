// # NordVPN Endpoint Source
//
// This crate provides the NordVPN server directory as an EndpointSource for
// the config generator.
//
// ## Behavior
//
// - One GET request per run, returning the whole directory
// - No pagination, no streaming, no caching between runs
// - No retries: any failure is reported as a fetch error and ends the run
// - The HTTP client carries its own timeout; the engine bounds the whole
//   fetch as well
//
// ## API Reference
//
// - Server directory: GET `https://api.nordvpn.com/v1/servers?limit=N`
//   returns a JSON array of server objects

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use wgconf_core::endpoint::Endpoint;
use wgconf_core::traits::EndpointSource;
use wgconf_core::{Error, Result};

/// Server directory URL; the limit is large enough for the full list
pub const DEFAULT_API_URL: &str = "https://api.nordvpn.com/v1/servers?limit=16384";

/// Default HTTP timeout for the directory request
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// NordVPN server directory
#[derive(Debug, Clone)]
pub struct NordVpnSource {
    /// Directory URL
    url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Request timeout
    timeout: Duration,
}

impl NordVpnSource {
    /// Create a source for `url` with the given request timeout
    ///
    /// # Errors
    ///
    /// [`Error::Fetch`] when the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wgconf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            timeout,
        })
    }

    /// Source for the public directory with the default timeout
    pub fn public() -> Result<Self> {
        Self::new(DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT)
    }

    /// Directory URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl EndpointSource for NordVpnSource {
    async fn fetch_all(&self) -> Result<Vec<Endpoint>> {
        debug!("GET {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::fetch(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(match status.as_u16() {
                429 => "Rate limited by the server directory (HTTP 429)".to_string(),
                500..=599 => format!("Server directory unavailable: HTTP {}", status),
                _ => format!("HTTP error: {}", status),
            }));
        }

        let endpoints: Vec<Endpoint> = response
            .json()
            .await
            .map_err(|e| Error::fetch(format!("Invalid server directory: {}", e)))?;
        debug!("Decoded {} endpoint(s) from {}", endpoints.len(), self.url);

        Ok(endpoints)
    }

    fn source_name(&self) -> &str {
        "nordvpn"
    }
}
