use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The reference does not point into this store.
    #[error("invalid blob reference: {0}")]
    InvalidReference(String),
    /// The remote object store rejected or failed the request.
    #[error("object storage error: {0}")]
    Backend(String),
    /// Every candidate name for a blob was already taken.
    #[error("no free blob name for {0}")]
    NameTaken(String),
    /// The configured backend is not compiled in or could not be constructed.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}
