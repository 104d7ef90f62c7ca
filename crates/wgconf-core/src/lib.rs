// # wgconf-core
//
// Core library for the WireGuard configuration generator.
//
// ## Architecture Overview
//
// This library turns the provider's endpoint directory into ready-to-use
// WireGuard configuration files:
// - **selector**: Filters and orders endpoints (pure, no I/O)
// - **renderer**: Renders one endpoint into a file name and content (pure)
// - **EndpointSource**: Trait for retrieving the directory
// - **HostResolver**: Trait for optional hostname pre-resolution
// - **ConfigSink**: Trait for persisting rendered files
// - **Generator**: Orchestrates fetch → select → render → write
//
// ## Design Principles
//
// 1. **Pure Core**: Selection and rendering never touch the network or disk
// 2. **Single Pass**: One fetch, one ranking, sequential rendering
// 3. **Library-First**: The binary only reads the environment and wires parts
// 4. **Deterministic**: Same directory and settings yield the same files

pub mod config;
pub mod country;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod renderer;
pub mod resolver;
pub mod selector;
pub mod sink;
pub mod template;
pub mod traits;

// Re-export core types for convenience
pub use config::{GeneratorConfig, GeneratorConfigBuilder, OutputConfig};
pub use country::{CountryId, CountryList, parse_country_list};
pub use endpoint::Endpoint;
pub use engine::{GenerationReport, Generator};
pub use error::{Error, Result};
pub use renderer::{RenderContext, RenderedConfig, render};
pub use resolver::SystemResolver;
pub use selector::{MaxCount, SelectionCriteria, SelectionOrder, rank, select};
pub use sink::{DirectorySink, MemorySink};
pub use template::FileNameTemplate;
pub use traits::{ConfigSink, EndpointSource, HostResolver};
