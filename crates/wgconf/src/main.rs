// # wgconf - WireGuard Config Generator
//
// This binary is a THIN integration layer. Endpoint selection, rendering and
// the run flow live in wgconf-core; the server directory client lives in
// wgconf-source-nordvpn.
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging
// 3. Wiring the directory source, the resolver and an output sink
// 4. Running the generator once and mapping the outcome to an exit code
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Credentials
// - `IIO_WNCG_WIREGUARD_PRIVATE_KEY`: Interface private key (required)
//
// ### Selection
// - `IIO_WNCG_LOCATIONS`: Comma-separated country names or ISO codes
//   (default: Canada,UnitedStates; set but empty: any country)
// - `IIO_WNCG_GROUPS`: Comma-separated group titles (default: any group)
// - `IIO_WNCG_PREFER_LEAST_LOADED_SERVERS`: Order by load (default: true)
// - `IIO_WNCG_NUMBER_OF_REQUESTED_FILES`: File count, -1 for every match
//   (default: 1)
//
// ### Output
// - `IIO_WNCG_DESTINATION_DIRECTORY_PATH`: Output directory (default: .)
// - `IIO_WNCG_FILE_NAME_FORMAT`: File name template with `{n}`, `{country}`,
//   `{endpointId}` and `{load}` (default: wg{n}.conf)
// - `IIO_WNCG_DRY_RUN`: Log the files instead of writing them (default: false)
//
// ### Interface and Peer
// - `IIO_WNCG_INTERFACE_ADDRESS` (default: 10.5.0.2/32)
// - `IIO_WNCG_INTERFACE_DNS` (default: 103.86.96.100, 103.86.99.100)
// - `IIO_WNCG_INTERFACE_DISABLE_ROUTE`: Emit `Table = off` (default: false)
// - `IIO_WNCG_PEER_ALLOWED_IPS` (default: 0.0.0.0/0)
// - `IIO_WNCG_PEER_PERSISTENT_KEEP_ALIVE`: Seconds (default: 25)
//
// ### Runtime
// - `IIO_WNCG_API_URL`: Server directory URL
// - `IIO_WNCG_FETCH_TIMEOUT_SECS`: Directory fetch timeout (default: 30)
// - `IIO_WNCG_RESOLVE_HOSTNAMES`: Write peer IPs instead of hostnames
//   (default: false)
// - `IIO_WNCG_RESOLVE_TIMEOUT_SECS`: Per-hostname lookup timeout (default: 5)
// - `IIO_WNCG_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
//
// ## Example
//
// ```bash
// export IIO_WNCG_WIREGUARD_PRIVATE_KEY=your_private_key
// export IIO_WNCG_LOCATIONS=Canada,Germany
// export IIO_WNCG_NUMBER_OF_REQUESTED_FILES=3
// export IIO_WNCG_FILE_NAME_FORMAT='wg{n}-{country}.conf'
// export IIO_WNCG_DESTINATION_DIRECTORY_PATH=/etc/wireguard
//
// wgconf
// ```

use anyhow::Result;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use wgconf_core::config::DEFAULT_FETCH_TIMEOUT;
use wgconf_core::resolver::DEFAULT_RESOLVE_TIMEOUT;
use wgconf_core::{
    DirectorySink, Error, FileNameTemplate, GenerationReport, Generator, GeneratorConfig,
    MaxCount, MemorySink, RenderContext, SelectionOrder, SystemResolver, parse_country_list,
};
use wgconf_source_nordvpn::{DEFAULT_API_URL, NordVpnSource};

const PRIVATE_KEY: &str = "IIO_WNCG_WIREGUARD_PRIVATE_KEY";
const RESOLVE_HOSTNAMES: &str = "IIO_WNCG_RESOLVE_HOSTNAMES";
const LOCATIONS: &str = "IIO_WNCG_LOCATIONS";
const GROUPS: &str = "IIO_WNCG_GROUPS";
const DESTINATION: &str = "IIO_WNCG_DESTINATION_DIRECTORY_PATH";
const PREFER_LEAST_LOADED: &str = "IIO_WNCG_PREFER_LEAST_LOADED_SERVERS";
const FILE_NAME_FORMAT: &str = "IIO_WNCG_FILE_NAME_FORMAT";
const REQUESTED_FILES: &str = "IIO_WNCG_NUMBER_OF_REQUESTED_FILES";
const INTERFACE_ADDRESS: &str = "IIO_WNCG_INTERFACE_ADDRESS";
const INTERFACE_DNS: &str = "IIO_WNCG_INTERFACE_DNS";
const INTERFACE_DISABLE_ROUTE: &str = "IIO_WNCG_INTERFACE_DISABLE_ROUTE";
const PEER_ALLOWED_IPS: &str = "IIO_WNCG_PEER_ALLOWED_IPS";
const PEER_KEEP_ALIVE: &str = "IIO_WNCG_PEER_PERSISTENT_KEEP_ALIVE";
const API_URL: &str = "IIO_WNCG_API_URL";
const FETCH_TIMEOUT: &str = "IIO_WNCG_FETCH_TIMEOUT_SECS";
const RESOLVE_TIMEOUT: &str = "IIO_WNCG_RESOLVE_TIMEOUT_SECS";
const DRY_RUN: &str = "IIO_WNCG_DRY_RUN";
const LOG_LEVEL: &str = "IIO_WNCG_LOG_LEVEL";

const DEFAULT_LOCATIONS: &str = "Canada,UnitedStates";

/// Exit codes for the possible outcomes
///
/// - 0: Files were generated
/// - 1: Bad configuration, directory unavailable, or nothing to generate
/// - 2: Runtime error (output failure, runtime or logger setup)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitStatus {
    /// At least one file was generated
    Success = 0,
    /// Expected failure of the run
    Failure = 1,
    /// Unexpected failure
    RuntimeError = 2,
}

impl ExitStatus {
    fn for_error(err: &Error) -> Self {
        match err {
            Error::Config(_)
            | Error::Fetch(_)
            | Error::NoMatch { .. }
            | Error::NothingRendered { .. } => ExitStatus::Failure,
            _ => ExitStatus::RuntimeError,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

/// Application configuration, as read from the environment
struct Config {
    private_key: String,
    resolve_hostnames: bool,
    locations: String,
    groups: Vec<String>,
    destination: PathBuf,
    prefer_least_loaded: bool,
    file_name_format: String,
    requested_files: i64,
    interface_address: String,
    interface_dns: String,
    interface_disable_route: bool,
    peer_allowed_ips: String,
    peer_persistent_keep_alive: u16,
    api_url: String,
    fetch_timeout_secs: u64,
    resolve_timeout_secs: u64,
    dry_run: bool,
    log_level: Level,
}

// Custom Debug implementation that hides the private key
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("private_key", &"<REDACTED>")
            .field("locations", &self.locations)
            .field("groups", &self.groups)
            .field("destination", &self.destination)
            .field("requested_files", &self.requested_files)
            .field("file_name_format", &self.file_name_format)
            .field("api_url", &self.api_url)
            .field("dry_run", &self.dry_run)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`
    ///
    /// Every variable is read before failing, so the error lists all
    /// malformed values at once.
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvReader::new(lookup);

        let config = Self {
            private_key: env.required(PRIVATE_KEY),
            resolve_hostnames: env.flag(RESOLVE_HOSTNAMES, false),
            locations: env.raw(LOCATIONS).unwrap_or_else(|| DEFAULT_LOCATIONS.to_string()),
            groups: env
                .raw(GROUPS)
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            destination: PathBuf::from(env.string(DESTINATION, ".")),
            prefer_least_loaded: env.flag(PREFER_LEAST_LOADED, true),
            file_name_format: env.string(FILE_NAME_FORMAT, FileNameTemplate::DEFAULT),
            requested_files: env.number(REQUESTED_FILES, 1),
            interface_address: env.string(INTERFACE_ADDRESS, RenderContext::DEFAULT_ADDRESS),
            interface_dns: env.string(INTERFACE_DNS, RenderContext::DEFAULT_DNS),
            interface_disable_route: env.flag(INTERFACE_DISABLE_ROUTE, false),
            peer_allowed_ips: env.string(PEER_ALLOWED_IPS, RenderContext::DEFAULT_ALLOWED_IPS),
            peer_persistent_keep_alive: env.number(PEER_KEEP_ALIVE, RenderContext::DEFAULT_PERSISTENT_KEEPALIVE),
            api_url: env.string(API_URL, DEFAULT_API_URL),
            fetch_timeout_secs: env.number(FETCH_TIMEOUT, DEFAULT_FETCH_TIMEOUT.as_secs()),
            resolve_timeout_secs: env.number(RESOLVE_TIMEOUT, DEFAULT_RESOLVE_TIMEOUT.as_secs()),
            dry_run: env.flag(DRY_RUN, false),
            log_level: env.log_level(LOG_LEVEL),
        };

        if !config.api_url.starts_with("https://") && !config.api_url.starts_with("http://") {
            env.problem(format!(
                "{} must use HTTP or HTTPS scheme. Got: {}",
                API_URL, config.api_url
            ));
        }

        env.finish()?;
        Ok(config)
    }

    /// Turn the raw settings into a validated generator configuration
    ///
    /// Location tokens are parsed here, once logging is available, so that
    /// every rejected token is reported.
    fn generator_config(&self) -> wgconf_core::Result<GeneratorConfig> {
        let locations = parse_country_list(&self.locations);
        if locations.countries.is_empty() && !locations.rejected.is_empty() {
            warn!(
                "None of the locations in {} were recognized, endpoints from every country are eligible",
                LOCATIONS
            );
        }

        GeneratorConfig::builder(&self.private_key)
            .countries(locations.countries)
            .groups(self.groups.clone())
            .prefer_least_loaded(self.prefer_least_loaded)
            .requested_count(self.requested_files)
            .file_name_template(&self.file_name_format)
            .address(&self.interface_address)
            .dns(&self.interface_dns)
            .disable_routes(self.interface_disable_route)
            .allowed_ips(&self.peer_allowed_ips)
            .persistent_keepalive(self.peer_persistent_keep_alive)
            .resolve_hostnames(self.resolve_hostnames)
            .destination(&self.destination)
            .dry_run(self.dry_run)
            .fetch_timeout(Duration::from_secs(self.fetch_timeout_secs))
            .resolve_timeout(Duration::from_secs(self.resolve_timeout_secs))
            .build()
    }

    /// Log the effective configuration; the private key is masked
    fn log_summary(&self, config: &GeneratorConfig) {
        let selection = &config.selection;
        let render = &config.render;

        info!("Configuration:");
        info!("  {}: {}", PRIVATE_KEY, mask_secret(&render.private_key));
        info!("  {}: {}", RESOLVE_HOSTNAMES, render.resolve_hostnames);
        info!(
            "  {}: {}",
            LOCATIONS,
            if selection.countries.is_empty() {
                "any".to_string()
            } else {
                selection
                    .countries
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        );
        info!("  {}: {}", GROUPS, selection.groups.join(", "));
        info!("  {}: {}", DESTINATION, config.output.directory.display());
        info!(
            "  {}: {}",
            PREFER_LEAST_LOADED,
            selection.order == SelectionOrder::LeastLoaded
        );
        info!("  {}: {}", FILE_NAME_FORMAT, render.file_name_template);
        info!(
            "  {}: {}",
            REQUESTED_FILES,
            match selection.max_count {
                MaxCount::Limited(n) => n.to_string(),
                MaxCount::Unbounded => "all".to_string(),
            }
        );
        info!("  {}: {}", INTERFACE_ADDRESS, render.address);
        info!("  {}: {}", INTERFACE_DNS, render.dns);
        info!("  {}: {}", INTERFACE_DISABLE_ROUTE, render.disable_routes);
        info!("  {}: {}", PEER_ALLOWED_IPS, render.allowed_ips);
        info!("  {}: {}", PEER_KEEP_ALIVE, render.persistent_keepalive);
        info!("  {}: {}", API_URL, self.api_url);
        info!("  {}: {:?}", FETCH_TIMEOUT, config.fetch_timeout);
        info!("  {}: {:?}", RESOLVE_TIMEOUT, config.resolve_timeout);
        info!("  {}: {}", DRY_RUN, config.output.dry_run);

        if self.api_url.starts_with("http://") {
            warn!("{} uses HTTP (not HTTPS)", API_URL);
        }
    }
}

/// Reads variables and collects every problem found
struct EnvReader<F> {
    lookup: F,
    problems: Vec<String>,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            problems: Vec::new(),
        }
    }

    /// Value as set, `None` when unset
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
    }

    /// Trimmed value, `None` when unset or blank
    fn value(&self, name: &str) -> Option<String> {
        self.raw(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn problem(&mut self, message: String) {
        self.problems.push(message);
    }

    fn required(&mut self, name: &str) -> String {
        self.value(name).unwrap_or_else(|| {
            self.problem(format!("{} is required. Set it via: export {}=<value>", name, name));
            String::new()
        })
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.value(name).unwrap_or_else(|| default.to_string())
    }

    fn flag(&mut self, name: &str, default: bool) -> bool {
        let Some(value) = self.value(name) else {
            return default;
        };

        parse_bool(&value).unwrap_or_else(|| {
            self.problem(format!(
                "{} must be true/false, 1/0, yes/no or on/off. Got: {}",
                name, value
            ));
            default
        })
    }

    fn number<T>(&mut self, name: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(value) = self.value(name) else {
            return default;
        };

        value.parse().unwrap_or_else(|e| {
            self.problem(format!("{} must be a number. Got: {} ({})", name, value, e));
            default
        })
    }

    fn log_level(&mut self, name: &str) -> Level {
        let value = self.string(name, "info");
        parse_log_level(&value).unwrap_or_else(|| {
            self.problem(format!(
                "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                name, value
            ));
            Level::INFO
        })
    }

    fn finish(self) -> Result<()> {
        if self.problems.is_empty() {
            return Ok(());
        }
        anyhow::bail!("{}", self.problems.join("\n"))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_log_level(value: &str) -> Option<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// First five characters followed by `...`, or `****` for short secrets
fn mask_secret(secret: &str) -> String {
    if secret.chars().count() > 5 {
        format!("{}...", secret.chars().take(5).collect::<String>())
    } else {
        "****".to_string()
    }
}

/// Replace every occurrence of `secret` in `content` with its masked form
fn redact(content: &str, secret: &str) -> String {
    if secret.is_empty() {
        return content.to_string();
    }
    content.replace(secret, &mask_secret(secret))
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error:\n{}", e);
            return ExitStatus::Failure.into();
        }
    };

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitStatus::RuntimeError.into();
    }

    info!("Starting wgconf {}", env!("CARGO_PKG_VERSION"));

    let generator_config = match config.generator_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return ExitStatus::Failure.into();
        }
    };
    config.log_summary(&generator_config);

    // The run is sequential; a single-threaded runtime is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ExitStatus::RuntimeError.into();
        }
    };

    let status = rt.block_on(async {
        match run(&config, generator_config).await {
            Ok(report) => {
                info!(
                    "Done: {} file(s) generated from {} matching endpoint(s), {} skipped",
                    report.written.len(),
                    report.matched,
                    report.skipped.len()
                );
                ExitStatus::Success
            }
            Err(e) => {
                error!("{}", e);
                ExitStatus::for_error(&e)
            }
        }
    });

    status.into()
}

/// Wire the collaborators and run the generator once
async fn run(config: &Config, generator_config: GeneratorConfig) -> wgconf_core::Result<GenerationReport> {
    let source = NordVpnSource::new(&config.api_url, generator_config.fetch_timeout)?;
    let resolver = SystemResolver::new(generator_config.resolve_timeout);

    if !generator_config.output.dry_run {
        let sink = DirectorySink::new(&generator_config.output.directory);
        return Generator::new(
            Box::new(source),
            Box::new(resolver),
            Box::new(sink),
            generator_config,
        )
        .run()
        .await;
    }

    info!(
        "Dry run: nothing will be written to {}",
        generator_config.output.directory.display()
    );
    let sink = MemorySink::new();
    let directory = generator_config.output.directory.clone();
    let private_key = generator_config.render.private_key.clone();

    let report = Generator::new(
        Box::new(source),
        Box::new(resolver),
        Box::new(sink.clone()),
        generator_config,
    )
    .run()
    .await?;

    for rendered in sink.configs().await {
        info!(
            "{} would contain:\n{}",
            directory.join(&rendered.file_name).display(),
            redact(&rendered.content, &private_key)
        );
    }

    Ok(report)
}
