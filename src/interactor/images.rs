// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Image operations across the record store and the blob store.
//!
//! The payload always lives in the image row. With
//! [`ImageStorage::Offloaded`] it is also pushed to the blob store, and
//! payload reads come from there exclusively.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{Interactor, InteractorError, InteractorResult, Stage};
use crate::models::{Image, ImageFields, Session};
use crate::storage::{BlobPath, BlobStore, RecordKey, Records, StorageError};

/// Where image payloads are read from and mirrored to. Chosen once at
/// startup.
#[derive(Clone)]
pub enum ImageStorage {
    /// Payload kept only in the image row
    Inline,
    /// Payload also written to, and read from, a blob store
    Offloaded(Arc<dyn BlobStore>),
}

impl ImageStorage {
    pub fn is_offloaded(&self) -> bool {
        matches!(self, ImageStorage::Offloaded(_))
    }

    pub fn blob_store(&self) -> Option<&dyn BlobStore> {
        match self {
            ImageStorage::Inline => None,
            ImageStorage::Offloaded(blobs) => Some(blobs.as_ref()),
        }
    }
}

impl std::fmt::Debug for ImageStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageStorage::Inline => f.write_str("Inline"),
            ImageStorage::Offloaded(_) => f.write_str("Offloaded"),
        }
    }
}

/// Image bytes plus what a client needs to render them.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub image_id: String,
    pub format: String,
    pub bytes: Vec<u8>,
}

impl Interactor {
    /// Save a new image. With offloading, a failed blob push after the row
    /// was saved returns `PartialConsistency`; calling
    /// [`update_image`](Self::update_image) with the same id and fields
    /// brings both stores back in line.
    pub fn create_image(&self, session: &Session, fields: ImageFields) -> InteractorResult<Image> {
        let now = Utc::now();
        let image = Image {
            image_id: Uuid::new_v4().to_string(),
            account_id: session.account_id.clone(),
            name: fields.name,
            description: fields.description,
            url: fields.url,
            file_name: fields.file_name,
            format: fields.format,
            raw_image: fields.raw_image,
            created_at: now,
            updated_at: now,
        };
        let image = self
            .store
            .create(image)
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(
            parent: &self.span,
            account_id = %image.account_id,
            image_id = %image.image_id,
            bytes = image.raw_image.len(),
            "image saved"
        );

        self.push_payload(&image)?;
        Ok(image)
    }

    pub fn get_image(&self, session: &Session, image_id: &str) -> InteractorResult<Image> {
        self.store
            .get(&Image::key_for(&session.account_id, image_id))
            .map_err(InteractorError::store(Stage::PrimaryRead))
    }

    pub fn list_images(&self, session: &Session) -> InteractorResult<Vec<Image>> {
        self.store
            .list(&RecordKey::new([session.account_id.as_str()]))
            .map_err(InteractorError::store(Stage::PrimaryRead))
    }

    /// Image bytes, from the blob store when offloaded, otherwise from the
    /// row.
    pub fn image_payload(&self, session: &Session, image_id: &str) -> InteractorResult<ImagePayload> {
        let image = self.get_image(session, image_id)?;
        let bytes = match &self.images {
            ImageStorage::Inline => image.raw_image,
            ImageStorage::Offloaded(blobs) => blobs
                .get(&BlobPath::image(&image.account_id, &image.image_id))
                .map_err(InteractorError::store(Stage::SecondaryRead))?,
        };
        Ok(ImagePayload {
            image_id: image.image_id,
            format: image.format,
            bytes,
        })
    }

    /// Replace an image's fields and payload, row first, then blob.
    pub fn update_image(
        &self,
        session: &Session,
        image_id: &str,
        fields: ImageFields,
    ) -> InteractorResult<Image> {
        let now = Utc::now();
        let image = Image {
            image_id: image_id.to_string(),
            account_id: session.account_id.clone(),
            name: fields.name,
            description: fields.description,
            url: fields.url,
            file_name: fields.file_name,
            format: fields.format,
            raw_image: fields.raw_image,
            created_at: now,
            updated_at: now,
        };
        let image = self
            .store
            .update(image)
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(
            parent: &self.span,
            account_id = %image.account_id,
            image_id = %image.image_id,
            "image updated"
        );

        self.push_payload(&image)?;
        Ok(image)
    }

    /// Remove the row, then the blob.
    pub fn delete_image(&self, session: &Session, image_id: &str) -> InteractorResult<()> {
        self.store
            .delete::<Image>(&Image::key_for(&session.account_id, image_id))
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(
            parent: &self.span,
            account_id = %session.account_id,
            image_id = %image_id,
            "image deleted"
        );

        self.remove_payload(&session.account_id, image_id)
    }

    fn push_payload(&self, image: &Image) -> InteractorResult<()> {
        let ImageStorage::Offloaded(blobs) = &self.images else {
            return Ok(());
        };
        let path = BlobPath::image(&image.account_id, &image.image_id);
        blobs.put(&path, &image.raw_image).map_err(|source| {
            tracing::warn!(
                parent: &self.span,
                image_id = %image.image_id,
                error = %source,
                "image row saved but blob push failed"
            );
            InteractorError::PartialConsistency {
                stage: Stage::SecondaryWrite,
                record_id: image.image_id.clone(),
                source,
            }
        })
    }

    /// Remove an image blob whose row is already gone. A blob that is
    /// already missing counts as removed.
    pub(super) fn remove_payload(&self, account_id: &str, image_id: &str) -> InteractorResult<()> {
        let ImageStorage::Offloaded(blobs) = &self.images else {
            return Ok(());
        };
        match blobs.delete(&BlobPath::image(account_id, image_id)) {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(parent: &self.span, image_id = %image_id, "image blob already absent");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(
                    parent: &self.span,
                    image_id = %image_id,
                    error = %source,
                    "image row deleted but blob removal failed"
                );
                Err(InteractorError::PartialConsistency {
                    stage: Stage::SecondaryDelete,
                    record_id: image_id.to_string(),
                    source,
                })
            }
        }
    }
}
