use std::path::{Path, PathBuf};

use common::storage::{BlobStore, StorageError};

use crate::entity::resource;
use crate::error::{ResourceError, Result};
use crate::upload::PendingUpload;

/// Logical address a resource is attached to: an attribute of one owner entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    /// Type name of the owning entity, e.g. "User".
    pub model: String,
    pub id: i32,
    /// Slot on the owner, e.g. "avatar".
    pub attribute: String,
}

impl Owner {
    pub fn new(model: impl Into<String>, id: i32, attribute: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            id,
            attribute: attribute.into(),
        }
    }
}

/// In-memory content of a resource that has not reached disk yet.
#[derive(Debug, Default)]
pub enum Content {
    /// Nothing in memory. Saved resources read from their file.
    #[default]
    Unset,
    /// An upload to be moved into place on the next save.
    Pending(PendingUpload),
    /// Raw bytes, written (replacing the file) on every save.
    Resolved(Vec<u8>),
}

/// Accepted by [`Resource::set_content`].
#[derive(Debug)]
pub enum ContentValue {
    Bytes(Vec<u8>),
    Upload(PendingUpload),
}

impl From<Vec<u8>> for ContentValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for ContentValue {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<&str> for ContentValue {
    fn from(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }
}

impl From<String> for ContentValue {
    fn from(text: String) -> Self {
        Self::Bytes(text.into_bytes())
    }
}

impl From<PendingUpload> for ContentValue {
    fn from(upload: PendingUpload) -> Self {
        Self::Upload(upload)
    }
}

/// A file attached to an owner, plus its metadata.
///
/// `path` and `time_added` are filled in by the first
/// [`ResourceStore::save`](crate::store::ResourceStore::save) and never change
/// afterwards, even if `name` or `owner` are edited.
#[derive(Debug, Default)]
pub struct Resource {
    pub(crate) id: Option<i32>,
    pub owner: Owner,
    pub name: String,
    pub description: Option<String>,
    /// Left empty to have it guessed from `name` on creation.
    pub mime_type: String,
    /// Computed on creation when unset.
    pub size: Option<i64>,
    pub user_id: Option<i32>,
    pub(crate) path: Option<String>,
    pub(crate) time_added: Option<i64>,
    pub(crate) content: Content,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_owner(owner: Owner, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            ..Self::default()
        }
    }

    /// New resource seeded from an upload; owner fields still need setting.
    pub fn from_pending_upload(upload: PendingUpload) -> Self {
        let mut resource = Self::new();
        resource.set_content(upload);
        resource
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Location of the backing file, once the resource has been saved.
    pub fn full_path(&self) -> Option<&Path> {
        self.path.as_deref().map(Path::new)
    }

    pub fn time_added(&self) -> Option<i64> {
        self.time_added
    }

    pub fn content_state(&self) -> &Content {
        &self.content
    }

    /// Replace the in-memory content. Nothing touches the disk until save.
    ///
    /// An upload also overwrites `name`, `size` and `mime_type` with what the
    /// upload declares. Raw bytes leave those fields alone.
    pub fn set_content(&mut self, value: impl Into<ContentValue>) -> &Content {
        self.content = match value.into() {
            ContentValue::Upload(upload) => {
                self.name = upload.name().to_string();
                self.size = Some(upload.size());
                self.mime_type = upload.mime_type().to_string();
                Content::Pending(upload)
            }
            ContentValue::Bytes(bytes) => Content::Resolved(bytes),
        };
        &self.content
    }

    /// The resource's bytes.
    ///
    /// Comes from memory if set, else from the pending upload, else from the
    /// stored file of a saved resource. Whatever is read stays cached.
    pub async fn content(&mut self, blobs: &dyn BlobStore) -> Result<&[u8]> {
        if matches!(self.content, Content::Unset) {
            let path = match (self.id, self.path.as_deref()) {
                (Some(_), Some(path)) => PathBuf::from(path),
                _ => return Err(ResourceError::ContentUnavailable),
            };
            let bytes = blobs.get(&path).await.map_err(read_error)?;
            self.content = Content::Resolved(bytes);
        }

        match &mut self.content {
            Content::Resolved(bytes) => Ok(bytes.as_slice()),
            Content::Pending(upload) => upload.read().await.map_err(read_error),
            Content::Unset => Err(ResourceError::ContentUnavailable),
        }
    }
}

fn read_error(err: StorageError) -> ResourceError {
    if err.is_not_found() {
        ResourceError::ContentUnavailable
    } else {
        ResourceError::Storage(err)
    }
}

impl From<resource::Model> for Resource {
    fn from(model: resource::Model) -> Self {
        Self {
            id: Some(model.id),
            owner: Owner::new(model.owner_model, model.owner_id, model.owner_attribute),
            name: model.name,
            description: model.description,
            mime_type: model.mime_type,
            size: Some(model.size),
            user_id: model.user_id,
            path: Some(model.path),
            time_added: Some(model.time_added),
            content: Content::Unset,
        }
    }
}
