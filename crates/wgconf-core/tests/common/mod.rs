//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal collaborators and endpoint builders so that
//! contract tests exercise the real selector, renderer and engine.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wgconf_core::endpoint::{
    Country, Endpoint, Group, Location, Metadata, Pivot, Service, Technology,
    WIREGUARD_IDENTIFIER,
};
use wgconf_core::config::GeneratorConfig;
use wgconf_core::error::{Error, Result};
use wgconf_core::renderer::RenderedConfig;
use wgconf_core::traits::{ConfigSink, EndpointSource, HostResolver};

pub const CANADA: u32 = 38;
pub const FRANCE: u32 = 74;
pub const GERMANY: u32 = 81;
pub const UNITED_STATES: u32 = 228;

/// Builder for directory entries
#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    endpoint: Endpoint,
}

impl EndpointBuilder {
    /// Online wireguard endpoint with a public key, in Canada, load 50
    pub fn new(id: &str) -> Self {
        Self {
            endpoint: Endpoint {
                id: 0,
                name: format!("Endpoint {}", id),
                hostname: format!("{}.nordvpn.com", id),
                station: None,
                load: 50,
                technologies: vec![wireguard(Some(&format!("{}-public-key=", id)), "online")],
                groups: vec![group("Standard VPN servers")],
                services: vec![Service {
                    id: 1,
                    name: "VPN".to_string(),
                    identifier: "vpn".to_string(),
                }],
                locations: vec![location(CANADA)],
            },
        }
    }

    pub fn load(mut self, load: u32) -> Self {
        self.endpoint.load = load;
        self
    }

    pub fn country(mut self, country_id: u32) -> Self {
        self.endpoint.locations = vec![location(country_id)];
        self
    }

    pub fn no_location(mut self) -> Self {
        self.endpoint.locations.clear();
        self
    }

    pub fn group(mut self, title: &str) -> Self {
        self.endpoint.groups.push(group(title));
        self
    }

    pub fn offline(mut self) -> Self {
        self.endpoint.technologies = vec![wireguard(self.public_key().as_deref(), "offline")];
        self
    }

    pub fn without_wireguard(mut self) -> Self {
        self.endpoint.technologies = vec![Technology {
            id: 3,
            identifier: "openvpn_udp".to_string(),
            name: "OpenVPN UDP".to_string(),
            metadata: Vec::new(),
            pivot: Some(Pivot {
                status: "online".to_string(),
            }),
        }];
        self
    }

    pub fn without_public_key(mut self) -> Self {
        self.endpoint.technologies = vec![wireguard(None, "online")];
        self
    }

    pub fn build(self) -> Endpoint {
        self.endpoint
    }

    fn public_key(&self) -> Option<String> {
        self.endpoint
            .wireguard_public_key()
            .map(str::to_string)
    }
}

fn wireguard(public_key: Option<&str>, status: &str) -> Technology {
    Technology {
        id: 35,
        identifier: WIREGUARD_IDENTIFIER.to_string(),
        name: "Wireguard".to_string(),
        metadata: public_key
            .map(|key| {
                vec![Metadata {
                    name: "public_key".to_string(),
                    value: key.to_string(),
                }]
            })
            .unwrap_or_default(),
        pivot: Some(Pivot {
            status: status.to_string(),
        }),
    }
}

fn group(title: &str) -> Group {
    Group {
        id: 0,
        title: title.to_string(),
        identifier: title.to_lowercase().replace(' ', "_"),
    }
}

fn location(country_id: u32) -> Location {
    Location {
        id: 0,
        country: Country {
            id: country_id,
            name: format!("Country {}", country_id),
            code: String::new(),
        },
    }
}

/// Endpoint source returning a fixed directory
pub struct StaticSource {
    endpoints: Vec<Endpoint>,
    fetch_call_count: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints,
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle on the fetch counter
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetch_call_count)
    }
}

#[async_trait::async_trait]
impl EndpointSource for StaticSource {
    async fn fetch_all(&self) -> Result<Vec<Endpoint>> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.endpoints.clone())
    }

    fn source_name(&self) -> &str {
        "static"
    }
}

/// Endpoint source that always fails
pub struct FailingSource;

#[async_trait::async_trait]
impl EndpointSource for FailingSource {
    async fn fetch_all(&self) -> Result<Vec<Endpoint>> {
        Err(Error::fetch("connection refused"))
    }

    fn source_name(&self) -> &str {
        "failing"
    }
}

/// Endpoint source that answers after a delay
pub struct SlowSource {
    pub delay: Duration,
}

#[async_trait::async_trait]
impl EndpointSource for SlowSource {
    async fn fetch_all(&self) -> Result<Vec<Endpoint>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    fn source_name(&self) -> &str {
        "slow"
    }
}

/// Resolver answering from a fixed table; unknown hosts fail
pub struct ScriptedResolver {
    answers: HashMap<String, IpAddr>,
    resolve_call_count: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn answer(mut self, hostname: &str, ip: IpAddr) -> Self {
        self.answers.insert(hostname.to_string(), ip);
        self
    }

    /// Shared handle on the resolve counter
    pub fn resolve_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.resolve_call_count)
    }
}

#[async_trait::async_trait]
impl HostResolver for ScriptedResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(hostname)
            .copied()
            .ok_or_else(|| Error::resolution(hostname, "no such host"))
    }
}

/// Small deterministic generator for property-style tests
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// Random directory mixing countries, groups, loads and statuses
pub fn random_directory(rng: &mut Lcg, size: usize) -> Vec<Endpoint> {
    let countries = [CANADA, FRANCE, GERMANY, UNITED_STATES];

    (0..size)
        .map(|i| {
            let mut builder = EndpointBuilder::new(&format!("ep{}", i))
                .load(rng.below(101) as u32)
                .country(countries[rng.below(countries.len() as u64) as usize]);
            if rng.below(4) == 0 {
                builder = builder.offline();
            }
            if rng.below(5) == 0 {
                builder = builder.without_wireguard();
            }
            if rng.below(3) == 0 {
                builder = builder.group("P2P");
            }
            if rng.below(10) == 0 {
                builder = builder.no_location();
            }
            builder.build()
        })
        .collect()
}

/// Sink that refuses every write
pub struct RejectingSink;

#[async_trait::async_trait]
impl ConfigSink for RejectingSink {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    async fn write(&self, config: &RenderedConfig) -> Result<String> {
        Err(Error::output(format!("read-only destination for {}", config.file_name)))
    }
}

/// Configuration with the given count and defaults everywhere else
pub fn config_for(requested_count: i64) -> GeneratorConfig {
    GeneratorConfig::builder("private-key=")
        .requested_count(requested_count)
        .file_name_template("wg{n}.conf")
        .build()
        .expect("valid test configuration")
}
