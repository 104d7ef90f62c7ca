//! Configuration types for the config generator
//!
//! [`GeneratorConfig`] is built once through [`GeneratorConfigBuilder`] and
//! never changes afterwards. `build()` checks every setting and reports all
//! problems together in a single [`Error::Config`], so that a user fixes
//! their environment in one pass instead of one error per run.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::country::CountryId;
use crate::error::{Error, Result};
use crate::renderer::RenderContext;
use crate::resolver::DEFAULT_RESOLVE_TIMEOUT;
use crate::selector::{MaxCount, SelectionCriteria, SelectionOrder};
use crate::template::FileNameTemplate;

/// Default timeout for the directory fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Allowed fetch timeout range, in seconds
pub const FETCH_TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=300;

/// Allowed resolve timeout range, in seconds
pub const RESOLVE_TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=60;

/// Main generator configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Endpoint filters, ordering and count
    pub selection: SelectionCriteria,

    /// Interface/peer settings and file-name template
    pub render: RenderContext,

    /// Output settings
    pub output: OutputConfig,

    /// Upper bound on the directory fetch
    pub fetch_timeout: Duration,

    /// Upper bound on each hostname lookup
    pub resolve_timeout: Duration,
}

impl GeneratorConfig {
    /// Start building a configuration around the required private key
    pub fn builder(private_key: impl Into<String>) -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new(private_key)
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Destination directory
    pub directory: PathBuf,

    /// Render and log, but write nothing
    pub dry_run: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            dry_run: false,
        }
    }
}

/// Builder for [`GeneratorConfig`]
#[derive(Debug, Clone)]
pub struct GeneratorConfigBuilder {
    private_key: String,
    countries: Vec<CountryId>,
    groups: Vec<String>,
    order: SelectionOrder,
    requested_count: i64,
    file_name_template: String,
    address: String,
    dns: String,
    disable_routes: bool,
    allowed_ips: String,
    persistent_keepalive: u16,
    resolve_hostnames: bool,
    output: OutputConfig,
    fetch_timeout: Duration,
    resolve_timeout: Duration,
}

impl GeneratorConfigBuilder {
    /// Create a builder with defaults for every optional setting
    pub fn new(private_key: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            countries: Vec::new(),
            groups: Vec::new(),
            order: SelectionOrder::LeastLoaded,
            requested_count: 1,
            file_name_template: FileNameTemplate::DEFAULT.to_string(),
            address: RenderContext::DEFAULT_ADDRESS.to_string(),
            dns: RenderContext::DEFAULT_DNS.to_string(),
            disable_routes: false,
            allowed_ips: RenderContext::DEFAULT_ALLOWED_IPS.to_string(),
            persistent_keepalive: RenderContext::DEFAULT_PERSISTENT_KEEPALIVE,
            resolve_hostnames: false,
            output: OutputConfig::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }

    /// Allowed countries (empty = any)
    pub fn countries(mut self, countries: Vec<CountryId>) -> Self {
        self.countries = countries;
        self
    }

    /// Allowed group titles (empty = any)
    pub fn groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Prefer least loaded endpoints
    pub fn prefer_least_loaded(mut self, enabled: bool) -> Self {
        self.order = if enabled {
            SelectionOrder::LeastLoaded
        } else {
            SelectionOrder::AsListed
        };
        self
    }

    /// Number of files to produce, `-1` for all matches
    pub fn requested_count(mut self, count: i64) -> Self {
        self.requested_count = count;
        self
    }

    /// File-name template
    pub fn file_name_template(mut self, template: impl Into<String>) -> Self {
        self.file_name_template = template.into();
        self
    }

    /// Interface address
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Interface DNS servers
    pub fn dns(mut self, dns: impl Into<String>) -> Self {
        self.dns = dns.into();
        self
    }

    /// Emit `Table = off`
    pub fn disable_routes(mut self, disable: bool) -> Self {
        self.disable_routes = disable;
        self
    }

    /// Peer allowed IPs
    pub fn allowed_ips(mut self, allowed_ips: impl Into<String>) -> Self {
        self.allowed_ips = allowed_ips.into();
        self
    }

    /// Peer persistent keepalive in seconds
    pub fn persistent_keepalive(mut self, seconds: u16) -> Self {
        self.persistent_keepalive = seconds;
        self
    }

    /// Resolve peer hostnames before rendering
    pub fn resolve_hostnames(mut self, enabled: bool) -> Self {
        self.resolve_hostnames = enabled;
        self
    }

    /// Destination directory
    pub fn destination(mut self, directory: impl Into<PathBuf>) -> Self {
        self.output.directory = directory.into();
        self
    }

    /// Render without writing
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.output.dry_run = enabled;
        self
    }

    /// Directory fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Per-hostname resolve timeout
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    /// Validate every setting and build the configuration
    ///
    /// # Errors
    ///
    /// A single [`Error::Config`] listing every problem found.
    pub fn build(self) -> Result<GeneratorConfig> {
        let mut problems = Vec::new();

        if self.private_key.trim().is_empty() {
            problems.push("private key is required".to_string());
        }

        let max_count = match MaxCount::from_raw(self.requested_count) {
            Ok(MaxCount::Limited(0)) => {
                problems.push("requested file count must be -1 (all) or at least 1, got 0".to_string());
                None
            }
            Ok(max) => Some(max),
            Err(e) => {
                problems.push(config_message(e));
                None
            }
        };

        let template = FileNameTemplate::parse(self.file_name_template.trim());
        if template.as_str().is_empty() {
            problems.push("file name template cannot be empty".to_string());
        } else if !template.yields_unique_names() && max_count != Some(MaxCount::Limited(1)) {
            problems.push(format!(
                "file name template '{}' needs {{n}} or {{endpointId}} when more than one file is requested, names would collide",
                template
            ));
        }
        for token in template.unknown_placeholders() {
            warn!(
                "Unrecognized placeholder {} in file name template '{}', it will be kept as is",
                token, template
            );
        }

        for (name, value) in [
            ("interface address", &self.address),
            ("interface DNS", &self.dns),
            ("peer allowed IPs", &self.allowed_ips),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("{} cannot be empty", name));
            }
        }

        if self.persistent_keepalive == 0 {
            problems.push("persistent keepalive must be between 1 and 65535 seconds, got 0".to_string());
        }

        if !FETCH_TIMEOUT_RANGE_SECS.contains(&self.fetch_timeout.as_secs()) {
            problems.push(format!(
                "fetch timeout must be between {} and {} seconds, got {}",
                FETCH_TIMEOUT_RANGE_SECS.start(),
                FETCH_TIMEOUT_RANGE_SECS.end(),
                self.fetch_timeout.as_secs()
            ));
        }

        if !RESOLVE_TIMEOUT_RANGE_SECS.contains(&self.resolve_timeout.as_secs()) {
            problems.push(format!(
                "resolve timeout must be between {} and {} seconds, got {}",
                RESOLVE_TIMEOUT_RANGE_SECS.start(),
                RESOLVE_TIMEOUT_RANGE_SECS.end(),
                self.resolve_timeout.as_secs()
            ));
        }

        let max_count = match max_count {
            Some(max) if problems.is_empty() => max,
            _ => return Err(Error::config(problems.join("; "))),
        };

        Ok(GeneratorConfig {
            selection: SelectionCriteria::new()
                .with_countries(self.countries)
                .with_groups(self.groups)
                .with_order(self.order)
                .with_max_count(max_count),
            render: RenderContext {
                private_key: self.private_key.trim().to_string(),
                address: self.address.trim().to_string(),
                dns: self.dns.trim().to_string(),
                disable_routes: self.disable_routes,
                allowed_ips: self.allowed_ips.trim().to_string(),
                persistent_keepalive: self.persistent_keepalive,
                file_name_template: template,
                resolve_hostnames: self.resolve_hostnames,
            },
            output: self.output,
            fetch_timeout: self.fetch_timeout,
            resolve_timeout: self.resolve_timeout,
        })
    }
}

fn config_message(err: Error) -> String {
    match err {
        Error::Config(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::builder("key=").build().unwrap();

        assert_eq!(config.selection.max_count, MaxCount::Limited(1));
        assert_eq!(config.selection.order, SelectionOrder::LeastLoaded);
        assert!(config.selection.countries.is_empty());
        assert_eq!(config.render.address, "10.5.0.2/32");
        assert_eq!(config.render.dns, "103.86.96.100, 103.86.99.100");
        assert_eq!(config.render.allowed_ips, "0.0.0.0/0");
        assert_eq!(config.render.persistent_keepalive, 25);
        assert_eq!(config.render.file_name_template.as_str(), "wg{n}.conf");
        assert!(!config.render.disable_routes);
        assert!(!config.render.resolve_hostnames);
        assert_eq!(config.output, OutputConfig::default());
        assert_eq!(config.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
    }

    #[test]
    fn test_missing_key() {
        let err = GeneratorConfig::builder("  ").build().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("private key is required")));
    }

    #[test]
    fn test_all_problems_reported_together() {
        let err = GeneratorConfig::builder("")
            .requested_count(-5)
            .dns("")
            .fetch_timeout(Duration::from_secs(0))
            .build()
            .unwrap_err();

        let Error::Config(msg) = err else {
            panic!("expected a configuration error");
        };
        assert!(msg.contains("private key is required"));
        assert!(msg.contains("-5"));
        assert!(msg.contains("interface DNS cannot be empty"));
        assert!(msg.contains("fetch timeout"));
    }

    #[test]
    fn test_zero_count_rejected() {
        assert!(GeneratorConfig::builder("key=").requested_count(0).build().is_err());
    }

    #[test]
    fn test_zero_keepalive_rejected() {
        let err = GeneratorConfig::builder("key=")
            .persistent_keepalive(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("persistent keepalive"));
    }

    #[test]
    fn test_unbounded_count() {
        let config = GeneratorConfig::builder("key=")
            .requested_count(-1)
            .build()
            .unwrap();
        assert_eq!(config.selection.max_count, MaxCount::Unbounded);
    }

    #[test]
    fn test_static_template_only_for_single_file() {
        assert!(GeneratorConfig::builder("key=")
            .file_name_template("nordvpn.conf")
            .build()
            .is_ok());

        assert!(GeneratorConfig::builder("key=")
            .file_name_template("nordvpn.conf")
            .requested_count(3)
            .build()
            .is_err());

        assert!(GeneratorConfig::builder("key=")
            .file_name_template("  ")
            .build()
            .is_err());
    }

    #[test]
    fn test_template_must_distinguish_files() {
        for template in ["{country}.conf", "{load}.conf", "{country}-{load}.conf"] {
            let err = GeneratorConfig::builder("key=")
                .file_name_template(template)
                .requested_count(3)
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("names would collide"), "accepted '{}'", template);

            assert!(GeneratorConfig::builder("key=")
                .file_name_template(template)
                .requested_count(-1)
                .build()
                .is_err());

            assert!(GeneratorConfig::builder("key=")
                .file_name_template(template)
                .build()
                .is_ok());
        }

        for template in ["{endpointId}.conf", "{country}-{n}.conf"] {
            assert!(GeneratorConfig::builder("key=")
                .file_name_template(template)
                .requested_count(-1)
                .build()
                .is_ok());
        }
    }

    #[test]
    fn test_builder_carries_settings() {
        let config = GeneratorConfig::builder(" key= ")
            .countries(vec![CountryId::Canada])
            .groups(vec!["P2P".to_string()])
            .prefer_least_loaded(false)
            .requested_count(4)
            .file_name_template("{country}-{n}.conf")
            .disable_routes(true)
            .persistent_keepalive(60)
            .resolve_hostnames(true)
            .destination("/tmp/wg")
            .dry_run(true)
            .build()
            .unwrap();

        assert_eq!(config.render.private_key, "key=");
        assert_eq!(config.selection.countries, vec![CountryId::Canada]);
        assert_eq!(config.selection.groups, vec!["P2P".to_string()]);
        assert_eq!(config.selection.order, SelectionOrder::AsListed);
        assert_eq!(config.selection.max_count, MaxCount::Limited(4));
        assert!(config.render.disable_routes);
        assert!(config.render.resolve_hostnames);
        assert_eq!(config.render.persistent_keepalive, 60);
        assert_eq!(config.output.directory, PathBuf::from("/tmp/wg"));
        assert!(config.output.dry_run);
    }
}
