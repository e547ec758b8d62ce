use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{RecordPersistence, ResourceRecord};
use crate::entity::resource;
use crate::error::PersistenceError;
use crate::resource::Owner;

/// Resource rows in a relational database via sea-orm.
#[derive(Clone)]
pub struct SeaOrmPersistence {
    db: DatabaseConnection,
}

impl SeaOrmPersistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn apply(active: &mut resource::ActiveModel, record: &ResourceRecord) {
    active.owner_model = Set(record.owner_model.clone());
    active.owner_id = Set(record.owner_id);
    active.owner_attribute = Set(record.owner_attribute.clone());
    active.name = Set(record.name.clone());
    active.description = Set(record.description.clone());
    active.path = Set(record.path.clone());
    active.mime_type = Set(record.mime_type.clone());
    active.size = Set(record.size);
    active.user_id = Set(record.user_id);
    active.time_added = Set(record.time_added);
}

#[async_trait]
impl RecordPersistence for SeaOrmPersistence {
    async fn create(&self, record: &ResourceRecord) -> Result<i32, PersistenceError> {
        let active = resource::ActiveModel {
            owner_model: Set(record.owner_model.clone()),
            owner_id: Set(record.owner_id),
            owner_attribute: Set(record.owner_attribute.clone()),
            name: Set(record.name.clone()),
            description: Set(record.description.clone()),
            path: Set(record.path.clone()),
            mime_type: Set(record.mime_type.clone()),
            size: Set(record.size),
            user_id: Set(record.user_id),
            time_added: Set(record.time_added),
            ..Default::default()
        };

        let model = active.insert(&self.db).await?;
        Ok(model.id)
    }

    async fn update(&self, id: i32, record: &ResourceRecord) -> Result<(), PersistenceError> {
        let existing = resource::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PersistenceError::NotFound(id))?;

        let mut active: resource::ActiveModel = existing.into();
        apply(&mut active, record);

        active.update(&self.db).await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), PersistenceError> {
        let result = resource::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(PersistenceError::NotFound(id));
        }
        Ok(())
    }

    async fn find(&self, id: i32) -> Result<Option<resource::Model>, PersistenceError> {
        Ok(resource::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_owner(
        &self,
        owner: &Owner,
    ) -> Result<Vec<resource::Model>, PersistenceError> {
        Ok(resource::Entity::find()
            .filter(resource::Column::OwnerModel.eq(owner.model.as_str()))
            .filter(resource::Column::OwnerId.eq(owner.id))
            .filter(resource::Column::OwnerAttribute.eq(owner.attribute.as_str()))
            .order_by_asc(resource::Column::Id)
            .all(&self.db)
            .await?)
    }
}
