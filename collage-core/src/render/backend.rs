use crate::{
    assets::text::CaptionFontSource,
    foundation::{core::Rgba8, error::CollageResult, math::unpremultiply_rgba8_in_place},
    render::scene::VisualTree,
};

/// A rasterized collage as RGBA8 pixels.
///
/// Rasterizers produce **premultiplied alpha**; the flag makes that explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel bytes with straight alpha, as encoders expect them.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }

    /// Straight RGBA of one pixel; `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(self.data.get(i..i + 4)?);
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut px);
        }
        Some(px)
    }
}

/// Per-call rasterization options.
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterOptions {
    /// Fill behind the whole frame; overrides [`RenderSettings::clear_rgba`].
    pub background_color: Option<Rgba8>,
}

/// Rasterizer-agnostic settings.
#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// If set, rasterizers clear the frame to this colour before drawing.
    pub clear_rgba: Option<Rgba8>,
    /// Output width in pixels; defaults to the container width. Height keeps the aspect ratio.
    pub output_width: Option<u32>,
    /// Where caption glyphs come from.
    pub caption_font: CaptionFontSource,
}

/// Turns a retained [`VisualTree`] into pixels.
///
/// The root transform is honoured as-is; exporting at the identity view is the exporter's job.
pub trait Rasterizer {
    fn to_raster(&mut self, root: &VisualTree, opts: &RasterOptions) -> CollageResult<FrameRGBA>;
}

/// Available rasterizer kinds.
#[derive(Clone, Copy, Debug, Default)]
pub enum RasterizerKind {
    /// CPU rasterizer powered by `vello_cpu`.
    #[default]
    Cpu,
}

/// Create a rasterizer implementation.
pub fn create_rasterizer(kind: RasterizerKind, settings: &RenderSettings) -> Box<dyn Rasterizer> {
    match kind {
        RasterizerKind::Cpu => Box::new(crate::render::cpu::CpuRasterizer::new(settings.clone())),
    }
}
