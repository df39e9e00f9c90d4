use thiserror::Error;

/// Reasons an uploaded image is refused.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The payload is empty.
    #[error("no image data")]
    Empty,
    /// The leading bytes match none of the accepted image signatures.
    #[error("unsupported image format")]
    InvalidImageFormat,
    /// The payload exceeds the configured size limit.
    #[error("image exceeds size limit ({actual} > {limit} bytes)")]
    FileTooLarge { actual: u64, limit: u64 },
    /// The image dimensions exceed the configured limit.
    #[error("image dimensions {width}x{height} exceed {limit}px")]
    DimensionsTooLarge { width: u32, height: u32, limit: u32 },
    /// The signature matched but the content could not be decoded.
    #[error("image could not be decoded: {0}")]
    Decode(String),
    /// Re-encoding the normalized image failed.
    #[error("image could not be re-encoded: {0}")]
    Encode(String),
}

impl IngestError {
    /// Whether the error is the client's fault (as opposed to an encoder failure).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Encode(_))
    }
}
