//! Upload intake: guard every file, then store the survivors.
//!
//! Validation of a whole submission finishes before the first blob is
//! written, so a rejected file never leaves earlier files behind.

use chrono::{DateTime, Utc};
use gallery_common::ingest::{ImageGuard, IngestError, NormalizedImage};
use gallery_common::storage::{BlobName, BlobStore, ImageRole};
use tracing::{debug, warn};

use crate::error::{AppError, FieldErrors};
use crate::extractors::form::{UploadedFile, too_large_message};

/// A file waiting for the guard, tagged with its role and form field.
pub struct PendingUpload {
    pub file: UploadedFile,
    pub role: ImageRole,
    pub field: &'static str,
}

impl PendingUpload {
    pub fn new(file: UploadedFile, role: ImageRole, field: &'static str) -> Self {
        Self { file, role, field }
    }
}

/// A file the guard accepted, named and ready for the blob store.
pub struct AcceptedUpload {
    image: NormalizedImage,
    name: BlobName,
}

/// Run every upload through the guard on the blocking pool.
///
/// Rejections are gathered per field so the client sees all of them.
pub async fn accept_all(
    guard: &ImageGuard,
    uploads: Vec<PendingUpload>,
    submitted_at: DateTime<Utc>,
) -> Result<Vec<AcceptedUpload>, AppError> {
    let mut accepted = Vec::with_capacity(uploads.len());
    let mut rejected = FieldErrors::new();

    for upload in uploads {
        let guard = guard.clone();
        let PendingUpload { file, role, field } = upload;
        let UploadedFile {
            file_name,
            content_type,
            data,
        } = file;

        let result = tokio::task::spawn_blocking(move || guard.accept(&data, content_type.as_deref()))
            .await
            .map_err(|e| AppError::Internal(format!("image task failed: {e}")))?;

        match result {
            Ok(image) => {
                let name = BlobName::new(submitted_at, role, &file_name, image.format.extensions());
                accepted.push(AcceptedUpload { image, name });
            }
            Err(e) if e.is_rejection() => {
                debug!(field, file_name = %file_name, error = %e, "Upload rejected");
                rejected
                    .entry(field.to_string())
                    .or_default()
                    .push(rejection_message(&e));
            }
            Err(e) => return Err(AppError::Internal(e.to_string())),
        }
    }

    if !rejected.is_empty() {
        return Err(AppError::InvalidFields(rejected));
    }
    Ok(accepted)
}

/// Save accepted uploads in order and return their references.
///
/// Stops at the first failure. Blobs saved before it are left behind and
/// logged; nothing in the database refers to them.
pub async fn store_all(
    store: &dyn BlobStore,
    uploads: &[AcceptedUpload],
) -> Result<Vec<String>, AppError> {
    let mut references = Vec::with_capacity(uploads.len());
    for upload in uploads {
        match store
            .save(&upload.image.bytes, upload.image.content_type(), &upload.name)
            .await
        {
            Ok(reference) => references.push(reference),
            Err(e) => {
                if !references.is_empty() {
                    warn!(orphaned = ?references, "Blob save failed part-way through a submission");
                }
                return Err(e.into());
            }
        }
    }
    Ok(references)
}

fn rejection_message(err: &IngestError) -> String {
    match err {
        IngestError::Empty => "Please choose an image".into(),
        IngestError::InvalidImageFormat => {
            "Only .jpg, .jpeg, .png and .webp images can be uploaded".into()
        }
        IngestError::FileTooLarge { limit, .. } => too_large_message(*limit),
        IngestError::DimensionsTooLarge { limit, .. } => {
            format!("Image must be at most {limit}px on each side")
        }
        IngestError::Decode(_) | IngestError::Encode(_) => "The image could not be read".into(),
    }
}
