use std::path::Path;
use std::sync::Arc;

use common::storage::{BlobStore, StorageError};
use tracing::{debug, info, instrument, warn};

use crate::context::{Clock, CurrentActor, SystemClock};
use crate::error::{ResourceError, Result};
use crate::path::{SegmentError, derive_path, owner_dir, validate_segment, validate_top_segment};
use crate::persistence::{RecordPersistence, ResourceRecord};
use crate::resource::{Content, Owner, Resource};
use crate::upload::guess_mime_type;

/// What happened to the file half of a save.
#[derive(Debug)]
pub enum ContentWrite {
    Written { bytes: u64 },
    /// Nothing in memory to write (metadata-only save).
    Skipped,
    /// The row is committed but the file could not be written.
    Failed(StorageError),
}

#[derive(Debug)]
pub struct SaveOutcome {
    pub id: i32,
    pub content: ContentWrite,
}

impl SaveOutcome {
    /// `false` when the row was written but its file was not.
    pub fn content_saved(&self) -> bool {
        !matches!(self.content, ContentWrite::Failed(_))
    }
}

/// Keeps resource rows and their files in step.
///
/// Rows and files are not written transactionally. A save commits the row
/// first, then the file; a file failure leaves the row in place and is
/// reported through [`SaveOutcome`].
pub struct ResourceStore {
    persistence: Arc<dyn RecordPersistence>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
}

impl ResourceStore {
    pub fn new(persistence: Arc<dyn RecordPersistence>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            persistence,
            blobs,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    /// Directory every resource path starts with.
    pub fn root(&self) -> &Path {
        self.blobs.root()
    }

    /// Write the row, then the content.
    ///
    /// New resources get `time_added`, `user_id`, `path`, `size` and
    /// `mime_type` filled in first. Existing ones keep their path.
    #[instrument(skip(self, resource, actor), fields(id = ?resource.id(), name = %resource.name))]
    pub async fn save<A>(&self, resource: &mut Resource, actor: &A) -> Result<SaveOutcome>
    where
        A: CurrentActor + ?Sized,
    {
        let actor_id = actor.actor_id();

        let id = match resource.id {
            None => {
                let record = self.before_create(resource, actor_id).await?;
                let id = self.persistence.create(&record).await?;
                resource.id = Some(id);
                info!(id, path = %record.path, size = record.size, "Resource created");
                id
            }
            Some(id) => {
                self.persistence.update(id, &record_of(resource)).await?;
                debug!(id, "Resource updated");
                id
            }
        };

        let content = self.after_save(resource).await;
        Ok(SaveOutcome { id, content })
    }

    /// Delete the row, then the file. A file that is already gone is fine.
    ///
    /// Returns whether a file was removed.
    #[instrument(skip(self, resource), fields(id = ?resource.id()))]
    pub async fn delete(&self, resource: &Resource) -> Result<bool> {
        let id = resource.id().ok_or(ResourceError::NotPersisted)?;

        // Resolve first: a path outside the root fails before the row goes.
        let file = match resource.full_path() {
            Some(path) => Some(self.blobs.locate(path).await.map_err(|source| {
                ResourceError::FileDeleteFailed {
                    path: path.to_path_buf(),
                    source,
                }
            })?),
            None => None,
        };

        self.persistence.delete(id).await?;
        info!(id, "Resource deleted");
        self.after_delete(file.as_deref()).await
    }

    pub async fn delete_by_id(&self, id: i32) -> Result<bool> {
        let resource = self.find(id).await?.ok_or(ResourceError::NotFound(id))?;
        self.delete(&resource).await
    }

    pub async fn find(&self, id: i32) -> Result<Option<Resource>> {
        Ok(self.persistence.find(id).await?.map(Resource::from))
    }

    pub async fn find_by_owner(&self, owner: &Owner) -> Result<Vec<Resource>> {
        let rows = self.persistence.find_by_owner(owner).await?;
        Ok(rows.into_iter().map(Resource::from).collect())
    }

    /// Shorthand for [`Resource::content`] against this store's blobs.
    pub async fn read_content<'r>(&self, resource: &'r mut Resource) -> Result<&'r [u8]> {
        resource.content(self.blobs.as_ref()).await
    }

    /// Pre-commit stage for new rows.
    async fn before_create(
        &self,
        resource: &mut Resource,
        actor_id: Option<i32>,
    ) -> Result<ResourceRecord> {
        check_segment("owner model", validate_top_segment(&resource.owner.model))?;
        check_segment("owner attribute", validate_segment(&resource.owner.attribute))?;
        check_segment("name", validate_segment(&resource.name))?;

        if resource.time_added.is_none() {
            resource.time_added = Some(self.clock.now());
        }
        if let Some(actor_id) = actor_id {
            resource.user_id = Some(actor_id);
        }

        let dir = owner_dir(self.root(), &resource.owner);
        self.blobs
            .create_dir_all(&dir)
            .await
            .map_err(|source| ResourceError::DirectoryCreationFailed {
                path: dir.clone(),
                source,
            })?;

        let path = derive_path(self.root(), &resource.owner, &resource.name);
        resource.path = Some(path.to_string_lossy().into_owned());

        if resource.size.is_none() {
            resource.size = Some(match &resource.content {
                Content::Pending(upload) => upload.size(),
                Content::Resolved(bytes) => bytes.len() as i64,
                Content::Unset => 0,
            });
        }

        if resource.mime_type.is_empty() {
            resource.mime_type = guess_mime_type(&resource.name);
        }

        Ok(record_of(resource))
    }

    /// Post-commit stage: put whatever is in memory on disk.
    async fn after_save(&self, resource: &mut Resource) -> ContentWrite {
        let Some(path) = resource.full_path().map(Path::to_path_buf) else {
            return ContentWrite::Skipped;
        };

        match std::mem::take(&mut resource.content) {
            Content::Unset => ContentWrite::Skipped,
            Content::Pending(upload) => match upload.save_as(self.blobs(), &path).await {
                Ok(bytes) => {
                    resource.content = upload
                        .into_cached()
                        .map(Content::Resolved)
                        .unwrap_or_default();
                    ContentWrite::Written { bytes }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to store uploaded file");
                    // Keep the upload so a later save can retry.
                    resource.content = Content::Pending(upload);
                    ContentWrite::Failed(e)
                }
            },
            Content::Resolved(bytes) => {
                let result = self.blobs.put(&path, &bytes).await;
                resource.content = Content::Resolved(bytes);
                match result {
                    Ok(bytes) => ContentWrite::Written { bytes },
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to write resource file");
                        ContentWrite::Failed(e)
                    }
                }
            }
        }
    }

    async fn after_delete(&self, path: Option<&Path>) -> Result<bool> {
        let Some(path) = path else {
            return Ok(false);
        };

        match self.blobs.delete(path).await {
            Ok(removed) => {
                if !removed {
                    debug!(path = %path.display(), "Resource file already gone");
                }
                Ok(removed)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(source) => Err(ResourceError::FileDeleteFailed {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

fn check_segment(
    field: &'static str,
    checked: std::result::Result<&str, SegmentError>,
) -> Result<()> {
    checked
        .map(|_| ())
        .map_err(|e| ResourceError::InvalidPathSegment {
            field,
            reason: e.message(),
        })
}

fn record_of(resource: &Resource) -> ResourceRecord {
    ResourceRecord {
        owner_model: resource.owner.model.clone(),
        owner_id: resource.owner.id,
        owner_attribute: resource.owner.attribute.clone(),
        name: resource.name.clone(),
        description: resource.description.clone(),
        path: resource.path.clone().unwrap_or_default(),
        mime_type: resource.mime_type.clone(),
        size: resource.size.unwrap_or(0),
        user_id: resource.user_id,
        time_added: resource.time_added.unwrap_or(0),
    }
}
