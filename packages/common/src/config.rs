use std::path::PathBuf;

use serde::Deserialize;

/// Blob storage configuration.
///
/// The presence of `bucket` selects the object-storage backend; without it
/// uploads land on the local filesystem under `uploads_dir`.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    /// Directory that backs the public uploads path. Default: "./public/uploads".
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// URL path the uploads directory is served under. Default: "/uploads".
    #[serde(default = "default_public_path")]
    pub public_path: String,
    /// Object storage bucket. Selects the object backend when set.
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub object: ObjectStoreConfig,
    /// Per-file upload limit in bytes. Default: 5 MB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

/// Connection settings for an S3-compatible object store.
#[derive(Debug, Deserialize, Clone)]
pub struct ObjectStoreConfig {
    /// API endpoint. Default: "https://storage.googleapis.com".
    #[serde(default = "default_object_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_object_region")]
    pub region: String,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Base of the public URLs handed out as blob references.
    #[serde(default = "default_object_endpoint")]
    pub public_base_url: String,
    /// Key prefix inside the bucket. Default: "uploads".
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_path_style")]
    pub path_style: bool,
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("./public/uploads")
}
fn default_public_path() -> String {
    "/uploads".into()
}
fn default_max_upload_size() -> u64 {
    5 * 1024 * 1024
}
fn default_object_endpoint() -> String {
    "https://storage.googleapis.com".into()
}
fn default_object_region() -> String {
    "auto".into()
}
fn default_key_prefix() -> String {
    "uploads".into()
}
fn default_path_style() -> bool {
    true
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            public_path: default_public_path(),
            bucket: None,
            object: ObjectStoreConfig::default(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_object_endpoint(),
            region: default_object_region(),
            access_key: None,
            secret_key: None,
            public_base_url: default_object_endpoint(),
            key_prefix: default_key_prefix(),
            path_style: default_path_style(),
        }
    }
}
