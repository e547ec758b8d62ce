//! Where resource rows live.

mod database;
mod memory;

pub use database::SeaOrmPersistence;
pub use memory::MemoryPersistence;

use async_trait::async_trait;

use crate::entity::resource;
use crate::error::PersistenceError;
use crate::resource::Owner;

/// Column values of one resource row, minus the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub owner_model: String,
    pub owner_id: i32,
    pub owner_attribute: String,
    pub name: String,
    pub description: Option<String>,
    pub path: String,
    pub mime_type: String,
    pub size: i64,
    pub user_id: Option<i32>,
    pub time_added: i64,
}

impl ResourceRecord {
    pub fn into_model(self, id: i32) -> resource::Model {
        resource::Model {
            id,
            owner_model: self.owner_model,
            owner_id: self.owner_id,
            owner_attribute: self.owner_attribute,
            name: self.name,
            description: self.description,
            path: self.path,
            mime_type: self.mime_type,
            size: self.size,
            user_id: self.user_id,
            time_added: self.time_added,
        }
    }
}

/// Row storage for resources.
///
/// The store runs its own pre- and post-commit stages around these calls;
/// implementations only move rows.
#[async_trait]
pub trait RecordPersistence: Send + Sync {
    /// Insert a row and return its new id.
    async fn create(&self, record: &ResourceRecord) -> Result<i32, PersistenceError>;

    /// Overwrite every column of row `id`.
    async fn update(&self, id: i32, record: &ResourceRecord) -> Result<(), PersistenceError>;

    /// Remove row `id`. Fails with [`PersistenceError::NotFound`] if absent.
    async fn delete(&self, id: i32) -> Result<(), PersistenceError>;

    async fn find(&self, id: i32) -> Result<Option<resource::Model>, PersistenceError>;

    /// All rows attached to one owner slot, oldest first.
    async fn find_by_owner(&self, owner: &Owner)
    -> Result<Vec<resource::Model>, PersistenceError>;
}
