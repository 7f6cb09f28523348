//! Storage backend trait and implementations.
//!
//! [`StorageBackend`] is the seam between the artifact store and wherever the
//! bytes actually live. Production uses [`LocalBackend`]; tests can enable the
//! `mock` feature for an in-memory map.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::FileInfo;
use crate::error::Result;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for blob storage.
///
/// All paths are relative to the storage root and must pass
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this themselves.
///
/// ```
/// use std::path::Path;
/// # use solder_storage::{backend::StorageBackend, error::Result};
///
/// async fn size_of_logo(backend: &dyn StorageBackend, hash: &str) -> Result<usize> {
///     let path = Path::new("logo").join(hash);
///     match backend.exists(&path).await? {
///         true => Ok(backend.read(&path).await?.len()),
///         false => Ok(0),
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// List all files under an optional prefix.
    ///
    /// Collects [`list_stream()`](Self::list_stream) into a [`Vec`].
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream file metadata under an optional prefix.
    ///
    /// A prefix naming a directory that does not exist yields an empty
    /// stream, not an error.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, creating parent directories as needed.
    ///
    /// An existing file at `path` is overwritten.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
