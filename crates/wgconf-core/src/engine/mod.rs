//! Core generation engine
//!
//! The Generator is responsible for:
//! - Fetching the endpoint directory via EndpointSource
//! - Ranking endpoints with the selector
//! - Rendering configurations (resolving hostnames when asked)
//! - Handing rendered configurations to a ConfigSink
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐
//! │ EndpointSource │─── Vec<Endpoint> ───┐
//! └────────────────┘                     │
//!                                        ▼
//!                               ┌──────────────┐
//!                               │  Generator   │
//!                               └──────────────┘
//!                                        │
//!         ┌──────────────────────────────┼──────────────────────────┐
//!         │                              │                          │
//!         ▼                              ▼                          ▼
//! ┌──────────────┐              ┌──────────────┐           ┌──────────────┐
//! │   selector   │              │ HostResolver │           │  ConfigSink  │
//! │ (rank)       │              │ (optional)   │           │  (write)     │
//! └──────────────┘              └──────────────┘           └──────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Fetch the whole directory (bounded by the fetch timeout)
//! 2. Rank candidates; an empty result ends the run with `NoMatch`
//! 3. Prepare the sink
//! 4. Walk the ranked candidates until the requested count is written:
//!    endpoints without a key or whose lookup fails are skipped and do not
//!    advance the file index; a file name produced twice ends the run
//! 5. Report what was written and what was skipped

use std::collections::HashSet;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::GeneratorConfig;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::renderer::{self, RenderContext};
use crate::selector::{self, SelectionCriteria};
use crate::traits::{ConfigSink, EndpointSource, HostResolver};

/// A configuration that was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenConfig {
    /// 0-based file index
    pub index: usize,
    /// File name produced by the template
    pub file_name: String,
    /// Location reported by the sink
    pub location: String,
    /// Endpoint display name
    pub endpoint_name: String,
    /// Endpoint hostname
    pub hostname: String,
    /// Endpoint load
    pub load: u32,
}

/// An endpoint that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEndpoint {
    /// Endpoint display name
    pub endpoint_name: String,
    /// Why it was skipped
    pub reason: String,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Endpoints in the fetched directory
    pub fetched: usize,
    /// Endpoints that passed the filters
    pub matched: usize,
    /// Written configurations, in index order
    pub written: Vec<WrittenConfig>,
    /// Candidates skipped before the requested count was reached
    pub skipped: Vec<SkippedEndpoint>,
}

/// Core config generator
///
/// Runs a single pass: one fetch, one ranking, sequential rendering.
/// Holds no state between runs.
pub struct Generator {
    /// Endpoint directory
    source: Box<dyn EndpointSource>,

    /// Hostname resolver (used only when pre-resolution is enabled)
    resolver: Box<dyn HostResolver>,

    /// Destination for rendered configurations
    sink: Box<dyn ConfigSink>,

    /// Filters, ordering and count
    selection: SelectionCriteria,

    /// Interface/peer settings
    render: RenderContext,

    /// Upper bound on the directory fetch
    fetch_timeout: Duration,
}

impl Generator {
    /// Create a new generator
    ///
    /// # Parameters
    ///
    /// - `source`: Endpoint directory implementation
    /// - `resolver`: Hostname resolver implementation
    /// - `sink`: Destination for rendered configurations
    /// - `config`: Generator configuration
    pub fn new(
        source: Box<dyn EndpointSource>,
        resolver: Box<dyn HostResolver>,
        sink: Box<dyn ConfigSink>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            source,
            resolver,
            sink,
            selection: config.selection,
            render: config.render,
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// Run the generator once
    ///
    /// # Errors
    ///
    /// - [`Error::Fetch`]: directory unavailable or fetch timed out
    /// - [`Error::NoMatch`]: no endpoint passed the filters
    /// - [`Error::NothingRendered`]: candidates existed but all were skipped
    /// - [`Error::Output`]: the sink failed or a file name repeated
    pub async fn run(&self) -> Result<GenerationReport> {
        let endpoints = self.fetch().await?;
        info!(
            "{} endpoint(s) retrieved from {}",
            endpoints.len(),
            self.source.source_name()
        );

        let ranked = selector::rank(&endpoints, &self.selection)?;
        info!(
            "{} online wireguard endpoint(s) found in {}",
            ranked.len(),
            self.selection.describe()
        );

        self.sink.prepare().await?;

        let mut report = GenerationReport {
            fetched: endpoints.len(),
            matched: ranked.len(),
            ..GenerationReport::default()
        };

        let mut file_names = HashSet::new();
        for endpoint in ranked {
            if self.selection.max_count.is_reached(report.written.len()) {
                break;
            }

            let index = report.written.len();
            match self.render_one(endpoint, index, &mut file_names).await {
                Ok(written) => report.written.push(written),
                Err(e) if e.is_skippable() => {
                    warn!("Ignoring endpoint {}: {}", endpoint.name, e);
                    report.skipped.push(SkippedEndpoint {
                        endpoint_name: endpoint.name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if report.written.is_empty() {
            return Err(Error::NothingRendered {
                matched: report.matched,
            });
        }

        if let selector::MaxCount::Limited(requested) = self.selection.max_count
            && report.written.len() < requested
        {
            warn!(
                "Only {} of {} requested configuration(s) could be generated",
                report.written.len(),
                requested
            );
        }

        info!("{} configuration file(s) generated", report.written.len());
        Ok(report)
    }

    /// Fetch the directory, bounded by the fetch timeout
    async fn fetch(&self) -> Result<Vec<Endpoint>> {
        info!("Retrieving all endpoints from {} ...", self.source.source_name());

        match tokio::time::timeout(self.fetch_timeout, self.source.fetch_all()).await {
            Ok(result) => result,
            Err(_) => Err(Error::fetch(format!(
                "{} did not answer within {:?}",
                self.source.source_name(),
                self.fetch_timeout
            ))),
        }
    }

    /// Render and write a single endpoint
    ///
    /// `file_names` holds the names produced so far in this run.
    async fn render_one(
        &self,
        endpoint: &Endpoint,
        index: usize,
        file_names: &mut HashSet<String>,
    ) -> Result<WrittenConfig> {
        let rendered =
            renderer::render_resolved(endpoint, &self.render, index, self.resolver.as_ref())
                .await?;

        if !file_names.insert(rendered.file_name.clone()) {
            return Err(Error::output(format!(
                "File name {} for endpoint {} was already produced in this run",
                rendered.file_name, endpoint.name
            )));
        }

        let location = self.sink.write(&rendered).await?;

        info!(
            "Generated file: {} (name: {}, endpoint: {}, country: {}, load: {}, {})",
            location,
            endpoint.name,
            rendered.peer_host,
            renderer::country_label(endpoint),
            endpoint.load,
            memberships(endpoint)
        );

        Ok(WrittenConfig {
            index,
            file_name: rendered.file_name,
            location,
            endpoint_name: endpoint.name.clone(),
            hostname: endpoint.hostname.clone(),
            load: endpoint.load,
        })
    }
}

/// Groups, services and location names of an endpoint, for the run log
fn memberships(endpoint: &Endpoint) -> String {
    format!(
        "groups: [{}], services: [{}], locations: [{}]",
        join(endpoint.groups.iter().map(|g| g.title.as_str())),
        join(endpoint.services.iter().map(|s| s.name.as_str())),
        join(endpoint.locations.iter().map(|l| l.country.name.as_str()))
    )
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}
