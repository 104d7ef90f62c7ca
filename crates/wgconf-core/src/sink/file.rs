// # Directory Sink
//
// File-based implementation of ConfigSink.
//
// ## Purpose
//
// Writes one configuration file per rendered endpoint into a destination
// directory, creating the directory on first use.
//
// ## Write Behavior
//
// - Atomic writes: content goes to a temporary file which is then renamed
// - A failed write removes its temporary file
// - Existing files with the same name are replaced
// - File names must be plain names; separators and `.`/`..` are rejected
//   so that nothing is written outside the destination directory

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::renderer::RenderedConfig;
use crate::traits::ConfigSink;

/// Directory-backed config sink
///
/// # Example
///
/// ```rust,no_run
/// use wgconf_core::sink::DirectorySink;
/// use wgconf_core::traits::ConfigSink;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = DirectorySink::new("/etc/wireguard");
///     sink.prepare().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    /// Create a sink writing into `directory`
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Destination directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Resolve a file name inside the destination directory
    fn target_path(&self, file_name: &str) -> Result<PathBuf, Error> {
        if file_name.is_empty()
            || file_name == "."
            || file_name == ".."
            || file_name.contains('/')
            || file_name.contains('\\')
        {
            return Err(Error::output(format!(
                "Invalid configuration file name: '{}'",
                file_name
            )));
        }

        Ok(self.directory.join(file_name))
    }

    /// Write and flush `content` into the temp file
    async fn fill(file: &mut fs::File, temp_path: &Path, content: &[u8]) -> Result<(), Error> {
        file.write_all(content).await.map_err(|e| {
            Error::output(format!(
                "Failed to write to temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::output(format!(
                "Failed to flush temp file {}: {}",
                temp_path.display(),
                e
            ))
        })
    }

    /// Best-effort removal of a temp file left by a failed write
    async fn discard(temp_path: &Path) {
        if let Err(e) = fs::remove_file(temp_path).await {
            tracing::debug!("Could not remove temp file {}: {}", temp_path.display(), e);
        }
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(path: &Path) -> PathBuf {
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        PathBuf::from(temp)
    }
}

#[async_trait]
impl ConfigSink for DirectorySink {
    async fn prepare(&self) -> Result<(), Error> {
        if self.directory.as_os_str().is_empty() || self.directory.exists() {
            return Ok(());
        }

        fs::create_dir_all(&self.directory).await.map_err(|e| {
            Error::output(format!(
                "Failed to create destination directory {}: {}",
                self.directory.display(),
                e
            ))
        })?;

        tracing::debug!("Created destination directory {}", self.directory.display());
        Ok(())
    }

    async fn write(&self, config: &RenderedConfig) -> Result<String, Error> {
        let path = self.target_path(&config.file_name)?;
        let temp_path = Self::temp_path(&path);

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            Error::output(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        if let Err(e) = Self::fill(&mut file, &temp_path, config.content.as_bytes()).await {
            drop(file);
            Self::discard(&temp_path).await;
            return Err(e);
        }
        drop(file);

        // Atomic rename (temp -> actual)
        if let Err(e) = fs::rename(&temp_path, &path).await {
            Self::discard(&temp_path).await;
            return Err(Error::output(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )));
        }

        tracing::trace!("Configuration written to {}", path.display());
        Ok(path.display().to_string())
    }
}
