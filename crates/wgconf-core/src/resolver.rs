//! System hostname resolution
//!
//! [`SystemResolver`] uses the operating system resolver through
//! `tokio::net::lookup_host`, bounded by a per-lookup timeout. IPv4 results
//! are preferred; an IPv6 address is returned only when no IPv4 address
//! exists.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::renderer::WIREGUARD_PORT;
use crate::traits::HostResolver;

/// Default per-lookup timeout
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolver backed by the operating system
#[derive(Debug, Clone)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    /// Create a resolver with the given per-lookup timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Per-lookup timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLVE_TIMEOUT)
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr> {
        // Literal addresses need no lookup
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Ok(ip);
        }

        let lookup = tokio::net::lookup_host((hostname, WIREGUARD_PORT));
        let addresses: Vec<IpAddr> = match timeout(self.timeout, lookup).await {
            Ok(Ok(addrs)) => addrs.map(|a| a.ip()).collect(),
            Ok(Err(e)) => return Err(Error::resolution(hostname, e.to_string())),
            Err(_) => {
                return Err(Error::resolution(
                    hostname,
                    format!("lookup timed out after {:?}", self.timeout),
                ));
            }
        };

        pick_address(&addresses)
            .ok_or_else(|| Error::resolution(hostname, "no address returned"))
    }
}

fn pick_address(addresses: &[IpAddr]) -> Option<IpAddr> {
    addresses
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addresses.first())
        .copied()
}
