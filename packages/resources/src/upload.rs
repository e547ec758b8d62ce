use std::path::{Path, PathBuf};

use common::storage::{BlobStore, StorageError};
use tokio::fs;

/// Fallback MIME type when nothing better is known.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Guess a MIME type from a file name's extension.
pub fn guess_mime_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

/// A file that has been received but not yet stored.
///
/// The handle knows where the bytes currently sit and what the sender
/// declared about them. Nothing is copied until the owning resource is saved.
#[derive(Debug)]
pub struct PendingUpload {
    temp_path: PathBuf,
    name: String,
    size: i64,
    mime_type: String,
    bytes: Option<Vec<u8>>,
}

impl PendingUpload {
    pub fn new(
        temp_path: impl Into<PathBuf>,
        name: impl Into<String>,
        size: i64,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            temp_path: temp_path.into(),
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            bytes: None,
        }
    }

    /// Build a handle for a file already on disk, taking its size from the
    /// filesystem and guessing the MIME type from `name`.
    pub async fn from_path(
        temp_path: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let temp_path = temp_path.into();
        let name = name.into();
        let size = match fs::metadata(&temp_path).await {
            Ok(meta) => meta.len() as i64,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(temp_path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let mime_type = guess_mime_type(&name);
        Ok(Self::new(temp_path, name, size, mime_type))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared size in bytes.
    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Read the uploaded bytes, caching them in the handle.
    pub async fn read(&mut self) -> Result<&[u8], StorageError> {
        let bytes = match self.bytes.take() {
            Some(bytes) => bytes,
            None => match fs::read(&self.temp_path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StorageError::NotFound(
                        self.temp_path.display().to_string(),
                    ));
                }
                Err(e) => return Err(e.into()),
            },
        };
        Ok(self.bytes.insert(bytes).as_slice())
    }

    /// Move the upload to `target` inside `blobs`. Returns the stored size.
    pub async fn save_as(&self, blobs: &dyn BlobStore, target: &Path) -> Result<u64, StorageError> {
        blobs.put_file(target, &self.temp_path).await
    }

    /// Bytes read so far, if any.
    pub(crate) fn into_cached(self) -> Option<Vec<u8>> {
        self.bytes
    }
}
