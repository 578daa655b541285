//! Export of the retained collage to PNG or JPEG.
//!
//! Exports always rasterize the root at the identity view so the output does not depend on the
//! current zoom or pan; the interactive transform is restored afterwards on every path.

use std::{
    borrow::Cow,
    fmt,
    ops::Deref,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use image::ImageEncoder;

use crate::{
    foundation::{
        core::{Affine, Rgba8},
        error::{CollageError, CollageResult},
        math::premultiply_rgba8_in_place,
    },
    render::{
        backend::{FrameRGBA, RasterOptions, Rasterizer},
        scene::VisualTree,
    },
};

/// Download file stem.
pub const EXPORT_FILE_STEM: &str = "ai-collage";
/// JPEG quality, 0-100.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
/// Output encoding.
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// `ai-collage.<ext>`.
    pub fn file_name(self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = CollageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            other => Err(CollageError::validation(format!(
                "unknown export format '{other}'; expected png or jpeg"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Encoded collage ready to be saved.
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write to `dir/<file_name>` and return the path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> CollageResult<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)
            .with_context(|| format!("write export '{}'", path.display()))
            .map_err(|e| CollageError::export(format!("{e:#}")))?;
        Ok(path)
    }
}

/// Holds the root at the identity transform and puts the interactive one back on drop.
struct NeutralView<'a> {
    root: &'a mut VisualTree,
    saved: Affine,
}

impl<'a> NeutralView<'a> {
    fn enter(root: &'a mut VisualTree) -> Self {
        let saved = std::mem::replace(&mut root.transform, Affine::IDENTITY);
        Self { root, saved }
    }
}

impl Deref for NeutralView<'_> {
    type Target = VisualTree;

    fn deref(&self) -> &VisualTree {
        self.root
    }
}

impl Drop for NeutralView<'_> {
    fn drop(&mut self) {
        self.root.transform = self.saved;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Exporter {
    pub jpeg_quality: u8,
}

impl Default for Exporter {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Exporter {
    /// Rasterize `root` at the identity view and encode it.
    ///
    /// `background_color` fills pixels the collage does not cover. Any failure is reported as
    /// [`CollageError::Export`]; `root.transform` is unchanged afterwards either way.
    #[tracing::instrument(skip_all, fields(format = %format))]
    pub fn export(
        &self,
        root: &mut VisualTree,
        rasterizer: &mut dyn Rasterizer,
        format: ExportFormat,
        background_color: Option<Rgba8>,
    ) -> CollageResult<ExportArtifact> {
        let frame = {
            let view = NeutralView::enter(root);
            rasterizer.to_raster(
                &view,
                &RasterOptions {
                    background_color,
                },
            )
        }
        .map_err(CollageError::into_export)?;

        let bytes = self.encode(&frame, format).map_err(CollageError::into_export)?;
        tracing::debug!(
            width = frame.width,
            height = frame.height,
            bytes = bytes.len(),
            "collage exported"
        );
        Ok(ExportArtifact {
            file_name: format.file_name(),
            mime: format.mime(),
            bytes,
        })
    }

    pub fn encode(&self, frame: &FrameRGBA, format: ExportFormat) -> CollageResult<Vec<u8>> {
        let expected = frame.width as usize * frame.height as usize * 4;
        if frame.data.len() != expected {
            return Err(CollageError::export("frame byte length mismatch"));
        }
        let mut buf = Vec::new();
        match format {
            ExportFormat::Png => {
                let rgba = frame.to_straight_rgba8();
                image::codecs::png::PngEncoder::new(&mut buf)
                    .write_image(
                        &rgba,
                        frame.width,
                        frame.height,
                        image::ExtendedColorType::Rgba8,
                    )
                    .context("encode png")?;
            }
            ExportFormat::Jpeg => {
                let rgb = flatten_over_black(frame);
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality)
                    .write_image(
                        &rgb,
                        frame.width,
                        frame.height,
                        image::ExtendedColorType::Rgb8,
                    )
                    .context("encode jpeg")?;
            }
        }
        Ok(buf)
    }
}

/// Premultiplied colour is colour composited over black; drop alpha.
fn flatten_over_black(frame: &FrameRGBA) -> Vec<u8> {
    let data = if frame.premultiplied {
        Cow::Borrowed(&frame.data[..])
    } else {
        let mut premul = frame.data.clone();
        premultiply_rgba8_in_place(&mut premul);
        Cow::Owned(premul)
    };
    data.chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/export/mod.rs"]
mod tests;
