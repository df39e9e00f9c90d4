use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};

use super::error::IngestError;
use super::signature::ImageFormat;

/// Decode `data` and rotate the pixels to match its EXIF orientation.
pub(crate) fn decode_oriented(
    data: &[u8],
    format: ImageFormat,
    max_dimension: u32,
) -> Result<DynamicImage, IngestError> {
    let mut decoder = ImageReader::with_format(Cursor::new(data), format.codec())
        .into_decoder()
        .map_err(|e| IngestError::Decode(e.to_string()))?;

    let (width, height) = decoder.dimensions();
    if width > max_dimension || height > max_dimension {
        return Err(IngestError::DimensionsTooLarge {
            width,
            height,
            limit: max_dimension,
        });
    }

    // A malformed orientation tag is not worth rejecting the photo over.
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);

    let mut image =
        DynamicImage::from_decoder(decoder).map_err(|e| IngestError::Decode(e.to_string()))?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Encode pixels in `format`. The encoders write no EXIF, so the output
/// carries neither an orientation tag nor camera/GPS metadata.
pub(crate) fn encode(
    image: DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, IngestError> {
    let mut buf = Vec::new();
    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, jpeg_quality)),
        ImageFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buf)),
        ImageFormat::WebP => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(&mut buf)),
    };
    result.map_err(|e| IngestError::Encode(e.to_string()))?;
    Ok(buf)
}
