use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::StorageError;
use super::naming::BlobName;

/// Attempts at finding a free name before `save` gives up.
pub const MAX_NAME_ATTEMPTS: usize = 4;

/// Named blob storage for uploaded images.
///
/// References returned by `save` are what the database stores; they are
/// either root-relative paths or absolute URLs depending on the backend.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `name` and return the public reference.
    ///
    /// Never replaces an existing blob. If `name` is taken the blob is stored
    /// under `name.disambiguate()`, so the returned reference may differ from
    /// the requested name.
    async fn save(
        &self,
        data: &[u8],
        content_type: &str,
        name: &BlobName,
    ) -> Result<String, StorageError>;

    /// Delete a blob by its reference.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, reference: &str) -> Result<bool, StorageError>;

    /// Delete a blob, logging instead of failing.
    ///
    /// Used for cleanup after a committed change; an orphaned blob is
    /// preferable to failing the surrounding operation.
    async fn discard(&self, reference: &str) {
        if reference.is_empty() {
            return;
        }
        match self.delete(reference).await {
            Ok(true) => debug!(reference, "Deleted blob"),
            Ok(false) => warn!(reference, "Blob already missing on delete"),
            Err(e) => warn!(reference, error = %e, "Failed to delete blob"),
        }
    }
}
