use std::path::PathBuf;

use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

/// Failures raised by a [`RecordPersistence`](crate::persistence::RecordPersistence) backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Db(#[from] DbErr),

    #[error("Resource {0} not found")]
    NotFound(i32),
}

/// Failures of resource operations on a [`ResourceStore`](crate::store::ResourceStore).
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Nothing to read: no pending upload, no resolved bytes and no file on disk.
    #[error("Resource content is unavailable")]
    ContentUnavailable,

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("Failed to delete file {path}: {source}")]
    FileDeleteFailed {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("Invalid {field}: {reason}")]
    InvalidPathSegment {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Resource has not been saved yet")]
    NotPersisted,

    #[error("Resource {0} not found")]
    NotFound(i32),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ResourceError>;
