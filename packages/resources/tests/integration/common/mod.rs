use std::path::PathBuf;
use std::sync::Arc;

use ::common::storage::{BlobStore, FilesystemBlobStore};
use resources::config::DatabaseConfig;
use resources::database::init_db;
use resources::persistence::SeaOrmPersistence;
use resources::{FixedClock, ResourceStore};
use tempfile::TempDir;

pub const NOW: i64 = 1_717_171_717;

/// A store backed by a fresh sqlite file and storage root.
pub struct TestStore {
    pub store: ResourceStore,
    pub persistence: SeaOrmPersistence,
    pub root: PathBuf,
    pub dir: TempDir,
}

impl TestStore {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("resources.db").display()),
            max_connections: 1,
        };
        let db = init_db(&config)
            .await
            .expect("Failed to initialize database");
        let persistence = SeaOrmPersistence::new(db);

        let blobs = FilesystemBlobStore::new(dir.path().join("storage"))
            .await
            .expect("Failed to create blob store");
        let root = blobs.root().to_path_buf();

        let store = ResourceStore::new(Arc::new(persistence.clone()), Arc::new(blobs))
            .with_clock(Arc::new(FixedClock(NOW)));

        Self {
            store,
            persistence,
            root,
            dir,
        }
    }

    /// Write `data` to a scratch file standing in for an HTTP upload.
    pub fn upload_file(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.dir.path().join(format!("upload-{name}"));
        std::fs::write(&path, data).expect("Failed to write upload file");
        path
    }
}
