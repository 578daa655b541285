use std::sync::Arc;

use crate::{
    assets::{
        decode::{PreparedImage, decode_image},
        preview::{PreviewHandle, PreviewLedger},
    },
    foundation::{core::Rgba8, error::CollageResult},
};

/// Colour used when no background has been chosen.
pub const DEFAULT_BACKGROUND_HEX: &str = "#111827";

/// Collage background, dispatched explicitly by variant.
#[derive(Debug)]
pub enum Background {
    /// Solid colour.
    Color(Rgba8),
    /// Uploaded image, stretched to cover the container.
    Image {
        preview: PreviewHandle,
        name: String,
    },
    /// Generated image plus the prompt that produced it.
    Generated {
        preview: PreviewHandle,
        prompt: String,
    },
}

impl Default for Background {
    fn default() -> Self {
        Self::Color(default_background_color())
    }
}

pub fn default_background_color() -> Rgba8 {
    Rgba8::opaque(0x11, 0x18, 0x27)
}

impl Background {
    /// Decode an uploaded image into an [`Background::Image`].
    pub fn uploaded(ledger: &Arc<PreviewLedger>, name: &str, bytes: &[u8]) -> CollageResult<Self> {
        let pixels = Arc::new(decode_image(bytes)?);
        Ok(Self::Image {
            preview: ledger.issue(pixels),
            name: name.to_string(),
        })
    }

    /// Decode generator output into a [`Background::Generated`].
    pub fn generated(ledger: &Arc<PreviewLedger>, prompt: &str, bytes: &[u8]) -> CollageResult<Self> {
        let pixels = Arc::new(decode_image(bytes)?);
        Ok(Self::Generated {
            preview: ledger.issue(pixels),
            prompt: prompt.to_string(),
        })
    }

    pub fn color(&self) -> Option<Rgba8> {
        match self {
            Self::Color(c) => Some(*c),
            Self::Image { .. } | Self::Generated { .. } => None,
        }
    }

    pub fn image(&self) -> Option<&Arc<PreparedImage>> {
        match self {
            Self::Color(_) => None,
            Self::Image { preview, .. } | Self::Generated { preview, .. } => Some(preview.image()),
        }
    }

    pub fn preview_url(&self) -> Option<String> {
        match self {
            Self::Color(_) => None,
            Self::Image { preview, .. } | Self::Generated { preview, .. } => Some(preview.url()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Color(_) => "color",
            Self::Image { .. } => "image",
            Self::Generated { .. } => "generated",
        }
    }
}
