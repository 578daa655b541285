use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{CollageError, CollageResult};

#[derive(Clone, Debug)]
/// Decoded raster image in straight RGBA8 form.
///
/// Filters and cover-fitting operate on straight alpha; premultiplication happens when the
/// rasterizer builds its paint.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major straight RGBA8.
    pub rgba8: Arc<Vec<u8>>,
}

impl PreparedImage {
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> CollageResult<Self> {
        if width == 0 || height == 0 {
            return Err(CollageError::validation("image must not be empty"));
        }
        if rgba8.len() != width as usize * height as usize * 4 {
            return Err(CollageError::validation("image byte length mismatch"));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    pub(crate) fn to_rgba_image(&self) -> CollageResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.rgba8.as_ref().clone())
            .ok_or_else(|| CollageError::validation("image byte length mismatch"))
    }
}

/// Image encodings accepted for source and background images.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

/// Sniff the MIME type of encoded image bytes, restricted to [`ACCEPTED_MIME_TYPES`].
pub fn sniff_mime(bytes: &[u8]) -> CollageResult<&'static str> {
    let format = image::guess_format(bytes)
        .map_err(|_| CollageError::validation("unrecognized image encoding"))?;
    match format {
        image::ImageFormat::Png => Ok("image/png"),
        image::ImageFormat::Jpeg => Ok("image/jpeg"),
        image::ImageFormat::WebP => Ok("image/webp"),
        other => Err(CollageError::validation(format!(
            "unsupported image encoding {other:?}; expected png, jpeg or webp"
        ))),
    }
}

/// Decode encoded image bytes into straight RGBA8.
pub fn decode_image(bytes: &[u8]) -> CollageResult<PreparedImage> {
    sniff_mime(bytes)?;
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PreparedImage::from_rgba8(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
