use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::error::StorageError;
use super::naming::BlobName;
use super::traits::{BlobStore, MAX_NAME_ATTEMPTS};

/// Filesystem-backed blob store for a publicly served uploads directory.
///
/// Blobs are written flat into `base_path`; references take the form
/// `{public_path}/{name}`.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    public_path: String,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, public_path: String) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            public_path: public_path.trim_end_matches('/').to_string(),
        })
    }

    /// Map a reference produced by this store back to its file on disk.
    pub fn path_for(&self, reference: &str) -> Result<PathBuf, StorageError> {
        let name = reference
            .strip_prefix(&self.public_path)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::InvalidReference(reference.to_string()))?;

        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\', '\0'])
        {
            return Err(StorageError::InvalidReference(reference.to_string()));
        }

        Ok(self.base_path.join(name))
    }

    /// Path for a temporary file during writes. Hidden, so never a valid reference.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(format!(".{}.part", uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn save(
        &self,
        data: &[u8],
        _content_type: &str,
        name: &BlobName,
    ) -> Result<String, StorageError> {
        // The directory may have been removed since startup.
        fs::create_dir_all(&self.base_path).await?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        // hard_link fails on an existing target where rename would replace it.
        let mut name = name.clone();
        let mut result = Err(StorageError::NameTaken(name.to_string()));
        for _ in 0..MAX_NAME_ATTEMPTS {
            match fs::hard_link(&temp_path, self.base_path.join(name.as_str())).await {
                Ok(()) => {
                    result = Ok(format!("{}/{}", self.public_path, name));
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(name = %name, "Blob name taken");
                    name = name.disambiguate();
                }
                Err(e) => {
                    result = Err(e.into());
                    break;
                }
            }
        }

        let _ = fs::remove_file(&temp_path).await;
        result
    }

    async fn delete(&self, reference: &str) -> Result<bool, StorageError> {
        let blob_path = self.path_for(reference)?;
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
