mod error;
mod naming;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod object;

use std::sync::Arc;

use tracing::info;

pub use error::StorageError;
pub use naming::{BlobName, ImageRole};
pub use traits::BlobStore;

use crate::config::StorageAppConfig;

/// Construct the blob store selected by configuration.
///
/// Called once at process start; the returned handle is shared by every request.
pub async fn build_blob_store(
    config: &StorageAppConfig,
) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config.bucket.as_deref() {
        Some(bucket) => build_object_store(bucket, config),
        None => {
            info!(
                "Using local blob storage at {}",
                config.uploads_dir.display()
            );
            let store = filesystem::FilesystemBlobStore::new(
                config.uploads_dir.clone(),
                config.public_path.clone(),
            )
            .await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(feature = "object-storage")]
fn build_object_store(
    bucket: &str,
    config: &StorageAppConfig,
) -> Result<Arc<dyn BlobStore>, StorageError> {
    info!("Using object storage bucket {bucket}");
    let store = object::ObjectBlobStore::new(bucket, &config.object)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "object-storage"))]
fn build_object_store(
    bucket: &str,
    _config: &StorageAppConfig,
) -> Result<Arc<dyn BlobStore>, StorageError> {
    Err(StorageError::Unavailable(format!(
        "bucket '{bucket}' configured but object-storage support is not compiled in"
    )))
}
