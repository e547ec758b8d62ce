use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Path-addressed blob storage rooted at a single directory.
///
/// Every path handed to a store must lie under [`BlobStore::root`]. Paths
/// are compared by the location they name, so different spellings of the
/// same directory are accepted.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// The directory all blobs live under.
    fn root(&self) -> &Path;

    /// Resolve `path` to the location it names under the root.
    ///
    /// Fails with [`StorageError::OutsideRoot`] when it names anything else.
    async fn locate(&self, path: &Path) -> Result<PathBuf, StorageError>;

    /// Store bytes at `path`, replacing any existing blob.
    async fn put(&self, path: &Path, data: &[u8]) -> Result<u64, StorageError>;

    /// Move the file at `source` (which may live outside the root) to `path`.
    async fn put_file(&self, path: &Path, source: &Path) -> Result<u64, StorageError>;

    /// Retrieve all bytes stored at `path`.
    async fn get(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, path: &Path) -> Result<BoxReader, StorageError>;

    /// Delete the blob at `path`.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, path: &Path) -> Result<bool, StorageError>;

    /// Create `dir` and any missing parents. Existing directories are not an error.
    async fn create_dir_all(&self, dir: &Path) -> Result<(), StorageError>;
}
