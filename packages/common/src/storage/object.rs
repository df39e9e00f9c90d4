use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::naming::BlobName;
use super::traits::{BlobStore, MAX_NAME_ATTEMPTS};
use crate::config::ObjectStoreConfig;

/// S3-compatible object store whose objects are publicly readable.
///
/// References are absolute URLs of the form
/// `{public_base_url}/{bucket}/{key_prefix}/{name}`.
pub struct ObjectBlobStore {
    bucket: Box<Bucket>,
    bucket_name: String,
    key_prefix: String,
    public_base_url: String,
}

impl ObjectBlobStore {
    pub fn new(bucket_name: &str, config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        let credentials = match (&config.access_key, &config.secret_key) {
            (Some(access), Some(secret)) => {
                Credentials::new(Some(access.as_str()), Some(secret.as_str()), None, None, None)
            }
            _ => Credentials::default(),
        }
        .map_err(|e| StorageError::Unavailable(format!("object storage credentials: {e}")))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Unavailable(format!("object storage bucket: {e}")))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            key_prefix: config.key_prefix.trim_matches('/').to_string(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn key_for(&self, name: &BlobName) -> String {
        if self.key_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.key_prefix, name)
        }
    }

    /// First key derived from `name` with no object behind it.
    ///
    /// S3 has no create-only put, so a writer racing between the check and
    /// the upload can still replace the object.
    async fn free_key(&self, name: &BlobName) -> Result<String, StorageError> {
        let mut name = name.clone();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let key = self.key_for(&name);
            if !self.exists(&key).await? {
                return Ok(key);
            }
            debug!(key = %key, "Object key taken");
            name = name.disambiguate();
        }
        Err(StorageError::NameTaken(name.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.bucket.head_object(key).await {
            Ok((_, 404)) => Ok(false),
            Ok((_, status)) if (200..300).contains(&status) => Ok(true),
            Ok((_, status)) => Err(StorageError::Backend(format!(
                "head of {key} returned HTTP {status}"
            ))),
            Err(e) => {
                let message = e.to_string();
                if message.contains("404") || message.contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(StorageError::Backend(message))
                }
            }
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket_name, key)
    }

    /// Recover the bucket-relative key from a public URL issued by this store.
    pub fn key_from_reference(&self, reference: &str) -> Result<String, StorageError> {
        let key = reference
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.strip_prefix(&self.bucket_name))
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty() && !key.split('/').any(|part| part == ".."))
            .ok_or_else(|| StorageError::InvalidReference(reference.to_string()))?;
        Ok(key.to_string())
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn save(
        &self,
        data: &[u8],
        content_type: &str,
        name: &BlobName,
    ) -> Result<String, StorageError> {
        let key = self.free_key(name).await?;
        let response = self
            .bucket
            .put_object_with_content_type(&key, data, content_type)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Backend(format!(
                "upload of {key} returned HTTP {status}"
            )));
        }

        Ok(self.public_url(&key))
    }

    async fn delete(&self, reference: &str) -> Result<bool, StorageError> {
        let key = self.key_from_reference(reference)?;
        let response = self
            .bucket
            .delete_object(&key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status_code() {
            404 => Ok(false),
            status if (200..300).contains(&status) => Ok(true),
            status => Err(StorageError::Backend(format!(
                "delete of {key} returned HTTP {status}"
            ))),
        }
    }
}
