//! Collage is a layout, viewport and rendering engine for AI-arranged photo collages.
//!
//! The session-oriented entry point is [`CollageStudio`]:
//!
//! - Add source images and pick a background and [`CollageStyle`]
//! - Ask a [`LayoutGenerator`] for a [`LayoutDocument`]; it is validated before it is installed
//! - Pan and zoom with [`ViewportEvent`]s
//! - Export to PNG or JPEG at the canonical (identity) view through a [`Rasterizer`]
//!
//! The pieces are usable on their own: [`render`] is a pure projection from a layout, images,
//! background and [`ViewState`] to a [`VisualTree`]; [`ViewportEngine`] owns the zoom/pan state;
//! [`Exporter`] neutralizes and restores the view transform around rasterization.
#![forbid(unsafe_code)]

pub mod assets;
pub mod export;
pub mod foundation;
pub mod generate;
pub mod layout;
pub mod render;
pub mod studio;
pub mod viewport;

pub use crate::assets::background::{Background, DEFAULT_BACKGROUND_HEX};
pub use crate::assets::collection::{FilterStyle, ImageCollection, ImageId, SourceImage};
pub use crate::assets::preview::{PreviewHandle, PreviewLedger};
pub use crate::assets::text::CaptionFontSource;
pub use crate::export::{ExportArtifact, ExportFormat, Exporter};
pub use crate::foundation::core::{Affine, ContainerSize, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{CollageError, CollageResult};
pub use crate::generate::{
    BackgroundGenerator, CollageStyle, FileLayoutGenerator, LayoutGenerator, LayoutRequest,
};
pub use crate::layout::document::{ImageBox, ImageFrame, LayoutDocument, Percent};
pub use crate::render::backend::{
    FrameRGBA, RasterOptions, Rasterizer, RasterizerKind, RenderSettings, create_rasterizer,
};
pub use crate::render::cpu::CpuRasterizer;
pub use crate::render::scene::{VisualTree, render};
pub use crate::studio::CollageStudio;
pub use crate::viewport::engine::{ViewState, ViewportEngine, ViewportEvent};
