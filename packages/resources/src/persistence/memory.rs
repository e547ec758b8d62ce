use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RecordPersistence, ResourceRecord};
use crate::entity::resource;
use crate::error::PersistenceError;
use crate::resource::Owner;

#[derive(Debug, Default)]
struct Rows {
    next_id: i32,
    rows: BTreeMap<i32, resource::Model>,
}

/// Process-local resource rows. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    inner: Mutex<Rows>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.rows.is_empty()
    }
}

#[async_trait]
impl RecordPersistence for MemoryPersistence {
    async fn create(&self, record: &ResourceRecord) -> Result<i32, PersistenceError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.insert(id, record.clone().into_model(id));
        Ok(id)
    }

    async fn update(&self, id: i32, record: &ResourceRecord) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock().await;
        match inner.rows.get_mut(&id) {
            Some(row) => {
                *row = record.clone().into_model(id);
                Ok(())
            }
            None => Err(PersistenceError::NotFound(id)),
        }
    }

    async fn delete(&self, id: i32) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock().await;
        inner
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistenceError::NotFound(id))
    }

    async fn find(&self, id: i32) -> Result<Option<resource::Model>, PersistenceError> {
        Ok(self.inner.lock().await.rows.get(&id).cloned())
    }

    async fn find_by_owner(
        &self,
        owner: &Owner,
    ) -> Result<Vec<resource::Model>, PersistenceError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rows
            .values()
            .filter(|row| {
                row.owner_model == owner.model
                    && row.owner_id == owner.id
                    && row.owner_attribute == owner.attribute
            })
            .cloned()
            .collect())
    }
}
