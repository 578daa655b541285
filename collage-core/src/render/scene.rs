//! Compositor: projects a layout document, its source images and the current view state into a
//! retained visual tree.
//!
//! Geometry is expressed in container units (the layout document's `container.width/height`);
//! the rasterizer maps units to pixels. Nothing here fails: inputs are validated before a layout
//! is installed.

use std::sync::Arc;

use crate::{
    assets::{
        background::Background, collection::FilterStyle, collection::SourceImage,
        decode::PreparedImage,
    },
    foundation::core::{Affine, ContainerSize, Rect, Rgba8, Vec2},
    layout::document::{ImageFrame, LayoutDocument},
    viewport::engine::ViewState,
};

/// Border around plain photos.
pub const PHOTO_BORDER: f64 = 2.0;
/// Card padding on the left, top and right of captioned photos.
pub const CARD_PADDING: f64 = 8.0;
/// Card padding under captioned photos (room for the caption).
pub const CARD_PADDING_BOTTOM: f64 = 24.0;
/// Horizontal inset of the caption strip.
pub const CAPTION_INSET_X: f64 = 8.0;
/// Gap between the caption strip and the card bottom.
pub const CAPTION_INSET_BOTTOM: f64 = 4.0;
/// Height of the caption line box.
pub const CAPTION_LINE_HEIGHT: f64 = 16.0;
/// Caption font size.
pub const CAPTION_FONT_SIZE: f32 = 12.0;
/// Caption text colour.
pub const CAPTION_COLOR: Rgba8 = Rgba8::opaque(0x1f, 0x29, 0x37);
/// Border and card colour.
pub const FRAME_COLOR: Rgba8 = Rgba8::WHITE;

/// Anything the compositor can place: decoded pixels plus a filter.
pub trait PhotoSource {
    fn pixels(&self) -> &Arc<PreparedImage>;
    fn filter(&self) -> FilterStyle;
}

impl PhotoSource for SourceImage {
    fn pixels(&self) -> &Arc<PreparedImage> {
        SourceImage::pixels(self)
    }

    fn filter(&self) -> FilterStyle {
        SourceImage::filter(self)
    }
}

#[derive(Clone, Debug)]
/// How the container background is painted.
pub enum BackgroundPaint {
    Solid(Rgba8),
    /// Image scaled to cover the container, centred.
    Cover(Arc<PreparedImage>),
}

impl From<&Background> for BackgroundPaint {
    fn from(bg: &Background) -> Self {
        match bg {
            Background::Color(c) => Self::Solid(*c),
            Background::Image { preview, .. } | Background::Generated { preview, .. } => {
                Self::Cover(Arc::clone(preview.image()))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Caption strip inside a card, in element-local units.
pub struct CaptionSlot {
    pub text: String,
    pub area: Rect,
    pub font_size: f32,
    pub color: Rgba8,
}

#[derive(Clone, Debug, PartialEq)]
/// Element decoration.
pub enum ElementBody {
    /// Photo inside a uniform border.
    Bordered { border: f64 },
    /// Photo on a card with a caption strip.
    Card { caption: CaptionSlot },
}

#[derive(Clone, Debug)]
/// One positioned photo.
pub struct PlacedElement {
    /// Index into the source image list (and the layout's `images`).
    pub source_index: usize,
    pub photo: Arc<PreparedImage>,
    pub filter: FilterStyle,
    /// Unrotated frame in container units.
    pub frame: Rect,
    pub rotation_deg: f64,
    pub z_index: i32,
    pub body: ElementBody,
}

impl PlacedElement {
    /// Element-local size; local origin is the frame's top-left corner.
    pub fn local_size(&self) -> Vec2 {
        Vec2::new(self.frame.width().max(0.0), self.frame.height().max(0.0))
    }

    /// Maps element-local units to container units, rotating about the frame centre.
    pub fn local_transform(&self) -> Affine {
        let half = self.local_size() * 0.5;
        let centre = Vec2::new(self.frame.x0, self.frame.y0) + half;
        Affine::translate(centre)
            * Affine::rotate(self.rotation_deg.to_radians())
            * Affine::translate(-half)
    }

    /// Area the photo occupies, in element-local units (may be empty for tiny cards).
    pub fn photo_rect(&self) -> Rect {
        let size = self.local_size();
        let (l, t, r, b) = match self.body {
            ElementBody::Bordered { border } => (border, border, border, border),
            ElementBody::Card { .. } => (
                CARD_PADDING,
                CARD_PADDING,
                CARD_PADDING,
                CARD_PADDING_BOTTOM,
            ),
        };
        let x1 = (size.x - r).max(l);
        let y1 = (size.y - b).max(t);
        Rect::new(l, t, x1, y1)
    }

    pub fn caption(&self) -> Option<&CaptionSlot> {
        match &self.body {
            ElementBody::Card { caption } => Some(caption),
            ElementBody::Bordered { .. } => None,
        }
    }
}

#[derive(Clone, Debug)]
/// Retained composition: the root every rasterization and export starts from.
pub struct VisualTree {
    pub size: ContainerSize,
    pub background: BackgroundPaint,
    /// View transform applied to the whole root, background included.
    pub transform: Affine,
    /// Elements in paint order.
    pub elements: Vec<PlacedElement>,
}

impl VisualTree {
    pub fn container_rect(&self) -> Rect {
        self.size.to_rect()
    }

    /// Re-apply a view state to the root.
    pub fn set_view(&mut self, view: ViewState) {
        self.transform = view.to_affine();
    }

    /// Source indices in paint order.
    pub fn paint_order(&self) -> Vec<usize> {
        self.elements.iter().map(|e| e.source_index).collect()
    }
}

/// Project `layout` + `images` + `background` + `view` into a [`VisualTree`].
///
/// Layout entries without a matching source image are skipped. Neither input is modified.
#[tracing::instrument(skip_all, fields(boxes = layout.images.len(), images = images.len()))]
pub fn render<S: PhotoSource>(
    layout: &LayoutDocument,
    images: &[S],
    background: &Background,
    view: ViewState,
) -> VisualTree {
    let size = ContainerSize {
        width: layout.container.width,
        height: layout.container.height,
    };

    let mut elements = Vec::with_capacity(layout.images.len());
    for index in layout.paint_order() {
        let Some(source) = images.get(index) else {
            tracing::debug!(index, "layout entry has no source image; skipped");
            continue;
        };
        let b = &layout.images[index];
        let frame = b.frame_rect(size);
        let body = match &b.frame {
            ImageFrame::Plain => ElementBody::Bordered {
                border: PHOTO_BORDER,
            },
            ImageFrame::Captioned(text) => ElementBody::Card {
                caption: caption_slot(text, frame),
            },
        };
        elements.push(PlacedElement {
            source_index: index,
            photo: Arc::clone(source.pixels()),
            filter: source.filter(),
            frame,
            rotation_deg: b.rotation,
            z_index: b.z_index,
            body,
        });
    }

    VisualTree {
        size,
        background: BackgroundPaint::from(background),
        transform: view.to_affine(),
        elements,
    }
}

fn caption_slot(text: &str, frame: Rect) -> CaptionSlot {
    let w = frame.width().max(0.0);
    let h = frame.height().max(0.0);
    let y1 = h - CAPTION_INSET_BOTTOM;
    CaptionSlot {
        text: text.to_string(),
        area: Rect::new(
            CAPTION_INSET_X,
            y1 - CAPTION_LINE_HEIGHT,
            (w - CAPTION_INSET_X).max(CAPTION_INSET_X),
            y1,
        ),
        font_size: CAPTION_FONT_SIZE,
        color: CAPTION_COLOR,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
