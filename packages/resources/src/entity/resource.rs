use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A file attached to one attribute of an owner entity.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Logical type name of the owner (e.g. "User").
    #[sea_orm(indexed)]
    pub owner_model: String,

    #[sea_orm(indexed)]
    pub owner_id: i32,

    /// Slot on the owner this file fills (e.g. "avatar").
    pub owner_attribute: String,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Full storage path, derived once at creation. Not unique: the layout
    /// lets two records with the same owner slot and name share a file.
    pub path: String,

    #[sea_orm(column_name = "type")]
    pub mime_type: String,

    pub size: i64,

    /// Uploader, absent for anonymous or system writes.
    pub user_id: Option<i32>,

    /// Unix timestamp (seconds).
    pub time_added: i64,
}

impl ActiveModelBehavior for ActiveModel {}
