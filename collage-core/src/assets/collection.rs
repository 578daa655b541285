use std::{fmt, str::FromStr, sync::Arc};

use crate::{
    assets::{
        decode::{PreparedImage, decode_image, sniff_mime},
        preview::{PreviewHandle, PreviewLedger},
    },
    foundation::error::{CollageError, CollageResult},
};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
/// Per-image colour filter.
pub enum FilterStyle {
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
}

impl FilterStyle {
    pub const ALL: [Self; 4] = [Self::None, Self::Grayscale, Self::Sepia, Self::Invert];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Invert => "invert",
        }
    }
}

impl fmt::Display for FilterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterStyle {
    type Err = CollageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| CollageError::validation(format!("unknown filter '{s}'")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Stable identifier of an image within a collection.
pub struct ImageId(pub(crate) u64);

impl ImageId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// One uploaded photo: encoded bytes, decoded preview and filter.
#[derive(Debug)]
pub struct SourceImage {
    id: ImageId,
    name: String,
    mime: &'static str,
    bytes: Arc<Vec<u8>>,
    preview: PreviewHandle,
    filter: FilterStyle,
}

impl SourceImage {
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Original encoded content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }

    pub fn preview_url(&self) -> String {
        self.preview.url()
    }

    pub fn pixels(&self) -> &Arc<PreparedImage> {
        self.preview.image()
    }

    pub fn filter(&self) -> FilterStyle {
        self.filter
    }
}

/// Ordered set of source images; the sole owner of their preview handles.
#[derive(Debug)]
pub struct ImageCollection {
    ledger: Arc<PreviewLedger>,
    images: Vec<SourceImage>,
    next_id: u64,
}

impl ImageCollection {
    pub fn new(ledger: Arc<PreviewLedger>) -> Self {
        Self {
            ledger,
            images: Vec::new(),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceImage> {
        self.images.iter()
    }

    pub fn as_slice(&self) -> &[SourceImage] {
        &self.images
    }

    pub fn get(&self, id: ImageId) -> Option<&SourceImage> {
        self.images.iter().find(|img| img.id == id)
    }

    /// Decode and append an image.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn add(&mut self, name: &str, bytes: Vec<u8>) -> CollageResult<ImageId> {
        let mime = sniff_mime(&bytes)?;
        let pixels = Arc::new(decode_image(&bytes)?);
        self.next_id += 1;
        let id = ImageId(self.next_id);
        self.images.push(SourceImage {
            id,
            name: name.to_string(),
            mime,
            bytes: Arc::new(bytes),
            preview: self.ledger.issue(pixels),
            filter: FilterStyle::None,
        });
        Ok(id)
    }

    /// Remove an image, releasing its preview. Returns whether it existed.
    pub fn remove(&mut self, id: ImageId) -> bool {
        let Some(pos) = self.images.iter().position(|img| img.id == id) else {
            return false;
        };
        self.images.remove(pos);
        true
    }

    /// Swap the content of an image in place; the old preview is released, the filter kept.
    pub fn replace(&mut self, id: ImageId, bytes: Vec<u8>) -> CollageResult<()> {
        let mime = sniff_mime(&bytes)?;
        let pixels = Arc::new(decode_image(&bytes)?);
        let ledger = Arc::clone(&self.ledger);
        let img = self.get_mut(id)?;
        img.mime = mime;
        img.bytes = Arc::new(bytes);
        img.preview = ledger.issue(pixels);
        Ok(())
    }

    pub fn set_filter(&mut self, id: ImageId, filter: FilterStyle) -> CollageResult<()> {
        self.get_mut(id)?.filter = filter;
        Ok(())
    }

    fn get_mut(&mut self, id: ImageId) -> CollageResult<&mut SourceImage> {
        self.images
            .iter_mut()
            .find(|img| img.id == id)
            .ok_or_else(|| CollageError::validation(format!("unknown image id {}", id.0)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/collection.rs"]
mod tests;
