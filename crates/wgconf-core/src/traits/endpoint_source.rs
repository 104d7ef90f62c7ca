// # Endpoint Source Trait
//
// Defines the interface for retrieving the provider's endpoint directory.
//
// ## Implementations
//
// - HTTP directory client: `wgconf-source-nordvpn` crate
// - Static lists: tests
//
// ## Contract
//
// "Return the full current list or fail." One call per run, no pagination,
// no streaming, no retries. The engine bounds the call with a timeout.

use async_trait::async_trait;

use crate::endpoint::Endpoint;

/// Trait for endpoint directory implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Errors
///
/// Network, HTTP status and decoding failures are all reported as
/// [`crate::Error::Fetch`].
#[async_trait]
pub trait EndpointSource: Send + Sync {
    /// Fetch every endpoint currently listed by the provider
    async fn fetch_all(&self) -> Result<Vec<Endpoint>, crate::Error>;

    /// Short name used in logs
    fn source_name(&self) -> &str;
}
