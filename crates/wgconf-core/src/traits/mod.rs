//! Collaborator traits
//!
//! The core never performs network or file I/O directly. It talks to the
//! outside world through these interfaces:
//!
//! - [`EndpointSource`]: Retrieve the provider's endpoint directory
//! - [`HostResolver`]: Resolve peer hostnames to addresses
//! - [`ConfigSink`]: Persist rendered configurations

pub mod endpoint_source;
pub mod host_resolver;
pub mod config_sink;

pub use endpoint_source::EndpointSource;
pub use host_resolver::HostResolver;
pub use config_sink::ConfigSink;
