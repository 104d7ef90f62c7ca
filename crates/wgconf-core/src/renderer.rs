//! WireGuard configuration rendering
//!
//! Turns one selected endpoint into a file name and a `wg-quick` style
//! configuration. Rendering itself performs no I/O; hostname pre-resolution
//! goes through a [`HostResolver`] supplied by the caller.
//!
//! ## Output
//!
//! ```text
//! [Interface]
//! PrivateKey = <key>
//! ListenPort = 51820
//! Address = <address>
//! DNS = <dns>
//! Table = off                 (only when routes are disabled)
//!
//! [Peer]
//! PublicKey = <peer key>
//! AllowedIPs = <ranges>
//! Endpoint = <host or ip>:51820
//! PersistentKeepalive = <seconds>
//! ```

use std::fmt;
use std::net::IpAddr;

use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::template::{FileNameTemplate, FileNameValues};
use crate::traits::HostResolver;

/// WireGuard port used on both sides of the tunnel
pub const WIREGUARD_PORT: u16 = 51820;

/// Provider domain stripped from hostnames to form endpoint ids
pub const PROVIDER_DOMAIN_SUFFIX: &str = ".nordvpn.com";

/// `{country}` value for endpoints without a location
pub const UNKNOWN_COUNTRY: &str = "unknown";

/// Interface and peer settings shared by every rendered file
#[derive(Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Interface private key
    /// ⚠️ NEVER log this value
    pub private_key: String,

    /// Interface address (CIDR)
    pub address: String,

    /// Interface DNS servers, as written after `DNS = `
    pub dns: String,

    /// Emit `Table = off` so wg-quick leaves routing alone
    pub disable_routes: bool,

    /// Peer allowed IP ranges
    pub allowed_ips: String,

    /// Peer persistent keepalive in seconds
    pub persistent_keepalive: u16,

    /// File-name template
    pub file_name_template: FileNameTemplate,

    /// Replace peer hostnames with a resolved address
    pub resolve_hostnames: bool,
}

impl RenderContext {
    /// Default interface address
    pub const DEFAULT_ADDRESS: &'static str = "10.5.0.2/32";

    /// Default interface DNS servers
    pub const DEFAULT_DNS: &'static str = "103.86.96.100, 103.86.99.100";

    /// Default peer allowed IPs
    pub const DEFAULT_ALLOWED_IPS: &'static str = "0.0.0.0/0";

    /// Default keepalive
    pub const DEFAULT_PERSISTENT_KEEPALIVE: u16 = 25;

    /// Context with default settings for the given private key
    pub fn new(private_key: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            address: Self::DEFAULT_ADDRESS.to_string(),
            dns: Self::DEFAULT_DNS.to_string(),
            disable_routes: false,
            allowed_ips: Self::DEFAULT_ALLOWED_IPS.to_string(),
            persistent_keepalive: Self::DEFAULT_PERSISTENT_KEEPALIVE,
            file_name_template: FileNameTemplate::default(),
            resolve_hostnames: false,
        }
    }
}

// Custom Debug implementation that hides the private key
impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("private_key", &"<REDACTED>")
            .field("address", &self.address)
            .field("dns", &self.dns)
            .field("disable_routes", &self.disable_routes)
            .field("allowed_ips", &self.allowed_ips)
            .field("persistent_keepalive", &self.persistent_keepalive)
            .field("file_name_template", &self.file_name_template.as_str())
            .field("resolve_hostnames", &self.resolve_hostnames)
            .finish()
    }
}

/// A rendered configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    /// File name produced by the template
    pub file_name: String,
    /// File content
    pub content: String,
    /// Peer host written in the `Endpoint` line (hostname or address)
    pub peer_host: String,
}

/// Endpoint id: the hostname without the provider domain suffix
pub fn endpoint_id(hostname: &str) -> &str {
    hostname
        .strip_suffix(PROVIDER_DOMAIN_SUFFIX)
        .unwrap_or(hostname)
}

/// Country label used in file names
pub fn country_label(endpoint: &Endpoint) -> String {
    endpoint
        .primary_country()
        .map(|c| c.label())
        .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
}

/// Render an endpoint using its hostname as the peer host.
///
/// `index` is the 0-based position among successfully rendered files.
///
/// # Errors
///
/// [`Error::MissingKey`] when the endpoint publishes no wireguard public key.
pub fn render(endpoint: &Endpoint, context: &RenderContext, index: usize) -> Result<RenderedConfig> {
    render_with_peer_host(endpoint, context, index, &endpoint.hostname)
}

/// Render an endpoint, resolving its hostname first when the context asks
/// for it.
///
/// # Errors
///
/// [`Error::MissingKey`] as for [`render`]; [`Error::Resolution`] when the
/// lookup fails. The key is checked before any lookup is attempted.
pub async fn render_resolved(
    endpoint: &Endpoint,
    context: &RenderContext,
    index: usize,
    resolver: &dyn HostResolver,
) -> Result<RenderedConfig> {
    if !context.resolve_hostnames {
        return render(endpoint, context, index);
    }

    if endpoint.wireguard_public_key().is_none() {
        return Err(Error::missing_key(&endpoint.name));
    }

    let address = resolver.resolve(&endpoint.hostname).await?;
    debug!("Resolved {} to {}", endpoint.hostname, address);

    render_with_peer_host(endpoint, context, index, &peer_host(address))
}

fn peer_host(address: IpAddr) -> String {
    match address {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", v6),
    }
}

fn render_with_peer_host(
    endpoint: &Endpoint,
    context: &RenderContext,
    index: usize,
    peer_host: &str,
) -> Result<RenderedConfig> {
    let public_key = endpoint
        .wireguard_public_key()
        .ok_or_else(|| Error::missing_key(&endpoint.name))?;

    let country = country_label(endpoint);
    let file_name = context.file_name_template.render(&FileNameValues {
        index,
        country: &country,
        endpoint_id: endpoint_id(&endpoint.hostname),
        load: endpoint.load,
    });

    Ok(RenderedConfig {
        file_name,
        content: config_content(context, public_key, peer_host),
        peer_host: peer_host.to_string(),
    })
}

fn config_content(context: &RenderContext, public_key: &str, peer_host: &str) -> String {
    let mut content = String::with_capacity(320);

    content.push_str("[Interface]\n");
    content.push_str(&format!("PrivateKey = {}\n", context.private_key));
    content.push_str(&format!("ListenPort = {}\n", WIREGUARD_PORT));
    content.push_str(&format!("Address = {}\n", context.address));
    content.push_str(&format!("DNS = {}\n", context.dns));
    if context.disable_routes {
        content.push_str("Table = off\n");
    }

    content.push_str("\n[Peer]\n");
    content.push_str(&format!("PublicKey = {}\n", public_key));
    content.push_str(&format!("AllowedIPs = {}\n", context.allowed_ips));
    content.push_str(&format!("Endpoint = {}:{}\n", peer_host, WIREGUARD_PORT));
    content.push_str(&format!(
        "PersistentKeepalive = {}\n",
        context.persistent_keepalive
    ));

    content
}
