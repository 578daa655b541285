//! Seams to the external layout and background generators.
//!
//! No network client lives here: callers plug in a [`LayoutGenerator`] / [`BackgroundGenerator`]
//! (an AI service, a fixture file, a test double). This module owns the request shape, the prompt
//! text and schema such a service needs, and strict parsing of its response.

pub mod prompt;

use std::{path::PathBuf, sync::Arc};

pub use prompt::{CollageStyle, background_prompt, collage_prompt, layout_response_schema};

use crate::{
    assets::collection::SourceImage,
    foundation::error::{CollageError, CollageResult},
    layout::document::LayoutDocument,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// One encoded source image as sent to a generator.
pub struct InlineImage {
    pub mime: &'static str,
    pub bytes: Arc<Vec<u8>>,
}

impl From<&SourceImage> for InlineImage {
    fn from(img: &SourceImage) -> Self {
        Self {
            mime: img.mime(),
            bytes: Arc::clone(img.shared_bytes()),
        }
    }
}

#[derive(Clone, Debug)]
/// Everything a layout generator is given.
pub struct LayoutRequest {
    /// Encoded images, in collection order.
    pub images: Vec<InlineImage>,
    pub style: CollageStyle,
    /// Colour hint the response must echo as `container.backgroundColor`.
    pub background_color: String,
}

impl LayoutRequest {
    pub fn prompt(&self) -> String {
        collage_prompt(self.images.len(), self.style, &self.background_color)
    }
}

/// Produces a layout document for a set of images.
pub trait LayoutGenerator {
    fn generate(&mut self, request: &LayoutRequest) -> CollageResult<LayoutDocument>;
}

/// Produces encoded background image bytes from a free-text style prompt.
pub trait BackgroundGenerator {
    fn generate(&mut self, prompt: &str) -> CollageResult<Vec<u8>>;
}

/// Parse a generator response and check it covers exactly `expected_images` images.
pub fn parse_layout_response(text: &str, expected_images: usize) -> CollageResult<LayoutDocument> {
    let doc = LayoutDocument::from_json(text.trim())?;
    doc.validate(expected_images)?;
    Ok(doc)
}

#[derive(Clone, Debug)]
/// Reads a stored generator response from disk.
pub struct FileLayoutGenerator {
    path: PathBuf,
}

impl FileLayoutGenerator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LayoutGenerator for FileLayoutGenerator {
    #[tracing::instrument(skip_all, fields(path = %self.path.display(), images = request.images.len()))]
    fn generate(&mut self, request: &LayoutRequest) -> CollageResult<LayoutDocument> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            CollageError::generation(format!(
                "read layout response '{}': {e}",
                self.path.display()
            ))
        })?;
        parse_layout_response(&text, request.images.len())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/mod.rs"]
mod tests;
