// # Memory Sink
//
// In-memory implementation of ConfigSink.
//
// ## Purpose
//
// Keeps rendered configurations in memory instead of writing files.
// Used for dry runs (configurations are rendered and logged, nothing touches
// the disk) and by tests that inspect what a run produced.

use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::renderer::RenderedConfig;
use crate::traits::ConfigSink;
use crate::Error;

/// In-memory config sink
///
/// Clones share the same storage, so a test can keep a handle while the
/// engine owns another.
///
/// # Example
///
/// ```rust,no_run
/// use wgconf_core::sink::MemorySink;
///
/// #[tokio::main]
/// async fn main() {
///     let sink = MemorySink::new();
///     // ... run the generator with a clone of `sink` ...
///     for config in sink.configs().await {
///         println!("{}", config.file_name);
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<RwLock<Vec<RenderedConfig>>>,
}

impl MemorySink {
    /// Create a new empty memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Configurations written so far, in write order
    pub async fn configs(&self) -> Vec<RenderedConfig> {
        self.inner.read().await.clone()
    }

    /// Number of configurations written
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if nothing was written
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl ConfigSink for MemorySink {
    async fn prepare(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn write(&self, config: &RenderedConfig) -> Result<String, Error> {
        self.inner.write().await.push(config.clone());
        Ok(format!("memory:{}", config.file_name))
    }
}
