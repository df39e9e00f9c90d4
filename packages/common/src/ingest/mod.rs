//! Validation and normalization of uploaded photos.
//!
//! Uploads are identified by their leading bytes, never by the declared
//! content type or extension, then decoded and re-encoded so the stored file
//! is upright and free of embedded metadata.

mod error;
mod normalize;
mod signature;

use tracing::debug;

pub use error::IngestError;
pub use signature::ImageFormat;

/// Default per-file limit (5 MB).
pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;

/// Default longest edge accepted before decoding pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 12_000;

const DEFAULT_JPEG_QUALITY: u8 = 90;

/// A photo that passed the guard, ready to be stored.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl NormalizedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Gatekeeper for uploaded photo bytes.
#[derive(Debug, Clone)]
pub struct ImageGuard {
    max_size: u64,
    max_dimension: u32,
    jpeg_quality: u8,
}

impl Default for ImageGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl ImageGuard {
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Validate and normalize one upload.
    ///
    /// Cheap checks (size, signature) run before any decoding. CPU-bound;
    /// async callers should run it on a blocking thread.
    pub fn accept(
        &self,
        data: &[u8],
        declared_mime: Option<&str>,
    ) -> Result<NormalizedImage, IngestError> {
        if data.is_empty() {
            return Err(IngestError::Empty);
        }

        let size = data.len() as u64;
        if size > self.max_size {
            return Err(IngestError::FileTooLarge {
                actual: size,
                limit: self.max_size,
            });
        }

        let format = ImageFormat::sniff(data).ok_or(IngestError::InvalidImageFormat)?;

        if let Some(declared) = declared_mime
            && ImageFormat::from_mime(declared) != Some(format)
        {
            debug!(
                declared,
                detected = format.content_type(),
                "Declared content type does not match payload"
            );
        }

        let image = normalize::decode_oriented(data, format, self.max_dimension)?;
        let bytes = normalize::encode(image, format, self.jpeg_quality)?;

        Ok(NormalizedImage { bytes, format })
    }
}
