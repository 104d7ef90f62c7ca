// # Config Sink Trait
//
// Destination for rendered configurations.
//
// ## Implementations
//
// - Directory: `DirectorySink` writes one file per configuration
// - Memory: `MemorySink` keeps them in memory (dry runs, tests)

use async_trait::async_trait;

use crate::renderer::RenderedConfig;

/// Trait for rendered configuration destinations
#[async_trait]
pub trait ConfigSink: Send + Sync {
    /// Prepare the destination (e.g. create the output directory)
    ///
    /// Called once, after selection succeeded and before the first write.
    async fn prepare(&self) -> Result<(), crate::Error>;

    /// Persist one configuration, returning where it was written
    ///
    /// # Errors
    ///
    /// [`crate::Error::Output`] on failure. Output errors end the run.
    async fn write(&self, config: &RenderedConfig) -> Result<String, crate::Error>;
}
