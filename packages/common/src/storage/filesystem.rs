use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;
use tracing::debug;

use super::error::StorageError;
use super::traits::{BlobStore, BoxReader};

/// Name of the staging directory kept directly under the root.
const STAGING_DIR: &str = ".tmp";

/// Filesystem-backed blob store.
///
/// Blobs live at caller-chosen paths under `base_path`. Writes are staged in
/// `{base_path}/.tmp` and renamed into place, so a reader never sees a
/// half-written file.
pub struct FilesystemBlobStore {
    /// Canonical form of the configured root.
    base_path: PathBuf,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating the root and staging directories.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(STAGING_DIR)).await?;
        let base_path = fs::canonicalize(&base_path).await?;
        Ok(Self { base_path })
    }

    /// Resolve `path` against the filesystem and check it lands under the root.
    ///
    /// The deepest existing ancestor is canonicalized; the missing tail may
    /// only hold plain names.
    async fn resolve(&self, path: &Path) -> Result<PathBuf, StorageError> {
        let outside = || StorageError::OutsideRoot(path.display().to_string());

        let absolute = std::path::absolute(path)?;
        let mut existing = absolute.as_path();
        let mut resolved = loop {
            match fs::canonicalize(existing).await {
                Ok(resolved) => break resolved,
                Err(_) => existing = existing.parent().ok_or_else(outside)?,
            }
        };

        let tail = absolute.strip_prefix(existing).map_err(|_| outside())?;
        for component in tail.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(outside()),
            }
        }

        if !resolved.starts_with(&self.base_path) {
            return Err(outside());
        }
        Ok(resolved)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(STAGING_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Rename a staged file into place, creating the parent chain first.
    async fn commit(&self, temp_path: &Path, target: &Path) -> Result<(), StorageError> {
        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                let _ = fs::remove_file(temp_path).await;
                return Err(e.into());
            }
        }

        if let Err(e) = fs::rename(temp_path, target).await {
            let _ = fs::remove_file(temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    fn root(&self) -> &Path {
        &self.base_path
    }

    async fn locate(&self, path: &Path) -> Result<PathBuf, StorageError> {
        self.resolve(path).await
    }

    async fn put(&self, path: &Path, data: &[u8]) -> Result<u64, StorageError> {
        let target = self.resolve(path).await?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        self.commit(&temp_path, &target).await?;
        Ok(data.len() as u64)
    }

    async fn put_file(&self, path: &Path, source: &Path) -> Result<u64, StorageError> {
        let target = self.resolve(path).await?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        match fs::rename(source, &target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(source.display().to_string()));
            }
            Err(e) => {
                // Most likely a cross-device move: copy through staging instead.
                debug!(source = %source.display(), error = %e, "rename failed, copying");
                let temp_path = self.temp_path();
                if let Err(e) = fs::copy(source, &temp_path).await {
                    let _ = fs::remove_file(&temp_path).await;
                    return Err(e.into());
                }
                self.commit(&temp_path, &target).await?;
                let _ = fs::remove_file(source).await;
            }
        }

        Ok(fs::metadata(&target).await?.len())
    }

    async fn get_stream(&self, path: &Path) -> Result<BoxReader, StorageError> {
        let target = self.resolve(path).await?;
        match fs::File::open(&target).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(target.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        let target = self.resolve(path).await?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_dir_all(&self, dir: &Path) -> Result<(), StorageError> {
        let target = self.resolve(dir).await?;
        match fs::create_dir_all(&target).await {
            Ok(()) => Ok(()),
            // Lost a race with another writer creating the same chain.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && target.is_dir() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
