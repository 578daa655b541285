//! Session controller owning all collage state: images, background, style, the installed layout,
//! the viewport and the retained visual root.
//!
//! Every mutation goes through `&mut self`; derived state (the visual tree) is rebuilt eagerly so
//! the root always reflects the latest inputs and view.

use std::sync::Arc;

use crate::{
    assets::{
        background::{Background, default_background_color},
        collection::{FilterStyle, ImageCollection, ImageId},
        preview::PreviewLedger,
    },
    export::{ExportArtifact, ExportFormat, Exporter},
    foundation::{
        core::Rgba8,
        error::{CollageError, CollageResult},
    },
    generate::{
        BackgroundGenerator, CollageStyle, InlineImage, LayoutGenerator, LayoutRequest,
        background_prompt,
    },
    layout::document::LayoutDocument,
    render::{
        backend::{FrameRGBA, RasterOptions, Rasterizer},
        scene::{VisualTree, render},
    },
    viewport::engine::{ViewState, ViewportEngine, ViewportEvent},
};

/// Fewest images a collage can be generated from.
pub const MIN_COLLAGE_IMAGES: usize = 2;

#[derive(Debug)]
pub struct CollageStudio {
    ledger: Arc<PreviewLedger>,
    images: ImageCollection,
    background: Background,
    style: CollageStyle,
    layout: Option<LayoutDocument>,
    viewport: ViewportEngine,
    tree: Option<VisualTree>,
    exporter: Exporter,
}

impl Default for CollageStudio {
    fn default() -> Self {
        Self::new()
    }
}

impl CollageStudio {
    pub fn new() -> Self {
        Self::with_ledger(PreviewLedger::new())
    }

    /// Session whose preview handles are counted by `ledger`.
    pub fn with_ledger(ledger: Arc<PreviewLedger>) -> Self {
        Self {
            images: ImageCollection::new(Arc::clone(&ledger)),
            ledger,
            background: Background::default(),
            style: CollageStyle::default(),
            layout: None,
            viewport: ViewportEngine::new(),
            tree: None,
            exporter: Exporter::default(),
        }
    }

    pub fn ledger(&self) -> &Arc<PreviewLedger> {
        &self.ledger
    }

    pub fn images(&self) -> &ImageCollection {
        &self.images
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn style(&self) -> CollageStyle {
        self.style
    }

    pub fn set_style(&mut self, style: CollageStyle) {
        self.style = style;
    }

    pub fn layout(&self) -> Option<&LayoutDocument> {
        self.layout.as_ref()
    }

    pub fn view_state(&self) -> ViewState {
        self.viewport.state()
    }

    pub fn visual_tree(&self) -> Option<&VisualTree> {
        self.tree.as_ref()
    }

    pub fn exporter_mut(&mut self) -> &mut Exporter {
        &mut self.exporter
    }

    /// Add an image. The installed layout no longer matches and is discarded.
    pub fn add_image(&mut self, name: &str, bytes: Vec<u8>) -> CollageResult<ImageId> {
        let id = self.images.add(name, bytes)?;
        self.discard_layout();
        Ok(id)
    }

    /// Remove an image; discards the layout when something was removed.
    pub fn remove_image(&mut self, id: ImageId) -> bool {
        let removed = self.images.remove(id);
        if removed {
            self.discard_layout();
        }
        removed
    }

    /// Swap an image's content; discards the layout.
    pub fn replace_image(&mut self, id: ImageId, bytes: Vec<u8>) -> CollageResult<()> {
        self.images.replace(id, bytes)?;
        self.discard_layout();
        Ok(())
    }

    /// Change one image's filter; the layout stays and the tree is rebuilt.
    pub fn set_filter(&mut self, id: ImageId, filter: FilterStyle) -> CollageResult<()> {
        self.images.set_filter(id, filter)?;
        self.rebuild();
        Ok(())
    }

    /// Colour hint sent to the layout generator.
    pub fn color_hint(&self) -> Rgba8 {
        self.background
            .color()
            .unwrap_or_else(default_background_color)
    }

    /// Ask `generator` for a layout and install it.
    ///
    /// On any failure the session is left exactly as it was.
    #[tracing::instrument(skip_all, fields(images = self.images.len(), style = %self.style))]
    pub fn generate_collage(&mut self, generator: &mut dyn LayoutGenerator) -> CollageResult<()> {
        if self.images.len() < MIN_COLLAGE_IMAGES {
            return Err(CollageError::validation(format!(
                "at least {MIN_COLLAGE_IMAGES} images are required to create a collage, got {}",
                self.images.len()
            )));
        }

        let request = LayoutRequest {
            images: self.images.iter().map(InlineImage::from).collect(),
            style: self.style,
            background_color: self.color_hint().to_string(),
        };
        let doc = generator.generate(&request)?;
        doc.validate(self.images.len())?;

        if self.background.color().is_some() {
            self.background = Background::Color(doc.container.background_rgba()?);
        }
        self.layout = Some(doc);
        self.viewport.reset();
        self.rebuild();
        tracing::debug!("collage layout installed");
        Ok(())
    }

    /// Generate and install a background image from a free-text style prompt.
    #[tracing::instrument(skip_all)]
    pub fn generate_background(
        &mut self,
        prompt: &str,
        generator: &mut dyn BackgroundGenerator,
    ) -> CollageResult<()> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CollageError::generation(
                "enter a prompt to generate a background",
            ));
        }
        let bytes = generator.generate(&background_prompt(prompt))?;
        let bg = Background::generated(&self.ledger, prompt, &bytes).map_err(|e| {
            CollageError::generation(format!("generated background is not a usable image: {e}"))
        })?;
        self.set_background(bg);
        Ok(())
    }

    pub fn set_background_color(&mut self, hex: &str) -> CollageResult<()> {
        let color = Rgba8::from_hex(hex)?;
        self.set_background(Background::Color(color));
        Ok(())
    }

    pub fn set_background_image(&mut self, name: &str, bytes: &[u8]) -> CollageResult<()> {
        let bg = Background::uploaded(&self.ledger, name, bytes)?;
        self.set_background(bg);
        Ok(())
    }

    /// Back to the default colour.
    pub fn clear_background(&mut self) {
        self.set_background(Background::default());
    }

    pub fn handle_viewport(&mut self, event: ViewportEvent) -> ViewState {
        let state = self.viewport.handle(event);
        self.apply_view();
        state
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.apply_view();
    }

    /// Export the collage at the identity view.
    #[tracing::instrument(skip_all, fields(format = %format))]
    pub fn export(
        &mut self,
        format: ExportFormat,
        rasterizer: &mut dyn Rasterizer,
    ) -> CollageResult<ExportArtifact> {
        let background_color = self.background.color();
        let tree = self
            .tree
            .as_mut()
            .ok_or_else(|| CollageError::export("no collage to export; generate one first"))?;
        self.exporter
            .export(tree, rasterizer, format, background_color)
    }

    /// Rasterize what the viewport currently shows, zoom and pan included.
    pub fn snapshot(&self, rasterizer: &mut dyn Rasterizer) -> CollageResult<FrameRGBA> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| CollageError::validation("no collage to show; generate one first"))?;
        rasterizer.to_raster(
            tree,
            &RasterOptions {
                background_color: None,
            },
        )
    }

    fn set_background(&mut self, bg: Background) {
        tracing::debug!(kind = bg.kind(), "background changed");
        self.background = bg;
        self.rebuild();
    }

    fn discard_layout(&mut self) {
        if self.layout.take().is_some() {
            tracing::debug!("image set changed; layout discarded");
        }
        self.tree = None;
    }

    fn rebuild(&mut self) {
        self.tree = self.layout.as_ref().map(|layout| {
            render(
                layout,
                self.images.as_slice(),
                &self.background,
                self.viewport.state(),
            )
        });
    }

    fn apply_view(&mut self) {
        let view = self.viewport.state();
        if let Some(tree) = self.tree.as_mut() {
            tree.set_view(view);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/studio/mod.rs"]
mod tests;
