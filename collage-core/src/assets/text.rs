use std::{path::PathBuf, sync::Arc};

use anyhow::Context;

use crate::foundation::{
    core::Rgba8,
    error::{CollageError, CollageResult},
};

/// Environment variable naming a font file for captions.
pub const CAPTION_FONT_ENV: &str = "COLLAGE_CAPTION_FONT";

const ELLIPSIS: char = '\u{2026}';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush colour used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

#[derive(Clone, Debug, Default)]
/// Where caption font bytes come from.
pub enum CaptionFontSource {
    /// `COLLAGE_CAPTION_FONT`, then a system font lookup.
    #[default]
    Auto,
    /// A specific font file.
    File(PathBuf),
    /// Captions are laid out but no glyphs are drawn.
    Disabled,
}

impl CaptionFontSource {
    /// Load font bytes; `Ok(None)` when no font is available.
    pub fn load(&self) -> CollageResult<Option<Arc<Vec<u8>>>> {
        match self {
            Self::Disabled => Ok(None),
            Self::File(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("read caption font '{}'", path.display()))?;
                Ok(Some(Arc::new(bytes)))
            }
            Self::Auto => {
                if let Some(path) = std::env::var_os(CAPTION_FONT_ENV) {
                    return Self::File(PathBuf::from(path)).load();
                }
                Ok(system_caption_font().map(Arc::new))
            }
        }
    }
}

/// First installed face matching the handwritten caption look, falling back to generic families.
fn system_caption_font() -> Option<Vec<u8>> {
    use usvg::fontdb::{Database, Family, Query};

    let mut db = Database::new();
    db.load_system_fonts();

    let families = [
        Family::Name("Special Elite"),
        Family::Cursive,
        Family::SansSerif,
        Family::Serif,
    ];
    let id = db
        .query(&Query {
            families: &families,
            ..Query::default()
        })
        .or_else(|| db.faces().next().map(|f| f.id))?;
    db.with_face_data(id, |data, _index| data.to_vec())
}

/// A shaped single-line caption.
pub struct CaptionLayout {
    pub layout: parley::Layout<TextBrushRgba8>,
    pub text: String,
    pub width: f32,
    pub height: f32,
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: Option<String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            family_name: None,
        }
    }

    /// Register font bytes; later layouts use this family.
    pub fn register_font(&mut self, font_bytes: &[u8]) -> CollageResult<()> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CollageError::validation("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CollageError::validation("registered font family has no name"))?
            .to_string();
        self.family_name = Some(family_name);
        Ok(())
    }

    pub fn has_font(&self) -> bool {
        self.family_name.is_some()
    }

    /// Shape `text` on one line without wrapping.
    pub fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> CollageResult<CaptionLayout> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CollageError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self
            .family_name
            .clone()
            .ok_or_else(|| CollageError::validation("no caption font registered"))?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        let width = layout.width();
        let height = layout.height();
        Ok(CaptionLayout {
            layout,
            text: text.to_string(),
            width,
            height,
        })
    }

    /// Shape `text`, cutting it and appending an ellipsis until it fits `max_width`.
    ///
    /// Returns an empty layout when not even the ellipsis fits.
    pub fn layout_truncated(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
        max_width: f32,
    ) -> CollageResult<CaptionLayout> {
        let full = self.layout_line(text, size_px, brush)?;
        if full.width <= max_width {
            return Ok(full);
        }

        let chars: Vec<char> = text.chars().collect();
        let (mut lo, mut hi) = (0usize, chars.len());
        let ellipsis = self.layout_line(&ELLIPSIS.to_string(), size_px, brush)?;
        if ellipsis.width > max_width {
            return self.layout_line("", size_px, brush);
        }
        let mut best = ellipsis;
        // Largest prefix whose "prefix…" fits; width is monotone in prefix length.
        while lo < hi {
            let mid = (lo + hi).div_ceil(2);
            let candidate: String = chars[..mid]
                .iter()
                .collect::<String>()
                .trim_end()
                .chars()
                .chain(std::iter::once(ELLIPSIS))
                .collect();
            let shaped = self.layout_line(&candidate, size_px, brush)?;
            if shaped.width <= max_width {
                best = shaped;
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        Ok(best)
    }
}
