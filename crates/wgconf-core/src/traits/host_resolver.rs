// # Host Resolver Trait
//
// Resolves peer hostnames to literal addresses when pre-resolution is
// enabled. Lookups are sequential and each one is bounded by a timeout
// chosen by the implementation.

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for hostname resolution
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `hostname` to a single address
    ///
    /// # Errors
    ///
    /// [`crate::Error::Resolution`] when the lookup fails, times out or
    /// yields no address.
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, crate::Error>;
}
