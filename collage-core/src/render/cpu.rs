use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use vello_cpu::kurbo::Shape as _;

use crate::{
    assets::{
        collection::FilterStyle,
        decode::PreparedImage,
        text::{TextBrushRgba8, TextLayoutEngine},
    },
    foundation::{
        core::{Affine, Rect, Rgba8, Vec2},
        error::{CollageError, CollageResult},
        math::premultiply_rgba8_in_place,
    },
    render::{
        backend::{FrameRGBA, RasterOptions, Rasterizer, RenderSettings},
        filter::apply_filter,
        scene::{BackgroundPaint, ElementBody, FRAME_COLOR, PlacedElement, VisualTree},
    },
};

/// Upper bound for any resampled paint edge, in pixels.
const MAX_PAINT_EDGE: f64 = 8192.0;

pub struct CpuRasterizer {
    settings: RenderSettings,
    font: FontState,
    paint_cache: HashMap<PaintKey, CachedPaint>,
}

enum FontState {
    Unresolved,
    Ready {
        data: vello_cpu::peniko::FontData,
        engine: Box<TextLayoutEngine>,
    },
    Unavailable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PaintKey {
    source: usize,
    filter: FilterStyle,
    width: u32,
    height: u32,
}

struct CachedPaint {
    // Keeps the keyed allocation alive so its address is not reused.
    _source: Arc<PreparedImage>,
    paint: vello_cpu::Image,
}

impl CpuRasterizer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            font: FontState::Unresolved,
            paint_cache: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn output_size(&self, root: &VisualTree) -> CollageResult<(u16, u16)> {
        let (cw, ch) = (root.size.width, root.size.height);
        if !(cw.is_finite() && ch.is_finite() && cw > 0.0 && ch > 0.0) {
            return Err(CollageError::validation(
                "container width and height must be finite and > 0",
            ));
        }
        let w = match self.settings.output_width {
            Some(w) => f64::from(w),
            None => cw.round(),
        }
        .max(1.0);
        let h = (w * ch / cw).round().max(1.0);
        let to_u16 = |v: f64, what: &str| -> CollageResult<u16> {
            if v > f64::from(u16::MAX) {
                return Err(CollageError::validation(format!(
                    "output {what} {v} exceeds {}",
                    u16::MAX
                )));
            }
            Ok(v as u16)
        };
        Ok((to_u16(w, "width")?, to_u16(h, "height")?))
    }

    fn ensure_font(&mut self) -> CollageResult<()> {
        if !matches!(self.font, FontState::Unresolved) {
            return Ok(());
        }
        self.font = match self.settings.caption_font.load()? {
            Some(bytes) => {
                let mut engine = Box::new(TextLayoutEngine::new());
                engine.register_font(&bytes)?;
                let data = vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                    0,
                );
                FontState::Ready { data, engine }
            }
            None => {
                tracing::warn!("no caption font available; captions will not be drawn");
                FontState::Unavailable
            }
        };
        Ok(())
    }

    /// `image` cover-cropped to `width`x`height` pixels, filtered, as a paint.
    fn cover_paint(
        &mut self,
        image: &Arc<PreparedImage>,
        filter: FilterStyle,
        width: u32,
        height: u32,
        used: &mut HashSet<PaintKey>,
    ) -> CollageResult<vello_cpu::Image> {
        let key = PaintKey {
            source: Arc::as_ptr(image) as usize,
            filter,
            width,
            height,
        };
        used.insert(key);
        if let Some(cached) = self.paint_cache.get(&key) {
            return Ok(cached.paint.clone());
        }

        let mut rgba8 = cover_resample(image, width, height)?;
        apply_filter(&mut rgba8, filter);
        premultiply_rgba8_in_place(&mut rgba8);
        let pixmap = image_premul_bytes_to_pixmap(&rgba8, width, height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.paint_cache.insert(
            key,
            CachedPaint {
                _source: Arc::clone(image),
                paint: paint.clone(),
            },
        );
        Ok(paint)
    }

    /// Fill `rect` (in the units of `transform`) with a cover-fitted image.
    fn draw_cover(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        transform: Affine,
        rect: Rect,
        image: &Arc<PreparedImage>,
        filter: FilterStyle,
        used: &mut HashSet<PaintKey>,
    ) -> CollageResult<()> {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Ok(());
        }
        let density = transform.determinant().abs().sqrt();
        let tw = paint_edge(rect.width() * density);
        let th = paint_edge(rect.height() * density);
        let paint = self.cover_paint(image, filter, tw, th, used)?;

        let placed = transform
            * Affine::translate(Vec2::new(rect.x0, rect.y0))
            * Affine::scale_non_uniform(
                rect.width() / f64::from(tw),
                rect.height() / f64::from(th),
            );
        ctx.set_transform(affine_to_cpu(placed));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(tw),
            f64::from(th),
        ));
        Ok(())
    }

    fn draw_element(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        device: Affine,
        el: &PlacedElement,
        used: &mut HashSet<PaintKey>,
    ) -> CollageResult<()> {
        let tr = device * el.local_transform();
        let size = el.local_size();

        // A plain border belongs to the filtered photo; a card does not.
        let frame_color = match el.body {
            ElementBody::Bordered { .. } => filtered(FRAME_COLOR, el.filter),
            ElementBody::Card { .. } => FRAME_COLOR,
        };
        ctx.set_transform(affine_to_cpu(tr));
        ctx.set_paint(solid(frame_color));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, size.x, size.y));

        self.draw_cover(ctx, tr, el.photo_rect(), &el.photo, el.filter, used)?;

        let Some(caption) = el.caption() else {
            return Ok(());
        };
        if caption.text.trim().is_empty() {
            return Ok(());
        }
        let FontState::Ready { data, engine } = &mut self.font else {
            return Ok(());
        };
        let shaped = engine.layout_truncated(
            &caption.text,
            caption.font_size,
            TextBrushRgba8::from(caption.color),
            caption.area.width() as f32,
        )?;
        let origin = Vec2::new(
            caption.area.x0 + (caption.area.width() - f64::from(shaped.width)).max(0.0) / 2.0,
            caption.area.y0 + (caption.area.height() - f64::from(shaped.height)) / 2.0,
        );
        ctx.set_transform(affine_to_cpu(tr * Affine::translate(origin)));
        for line in shaped.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }
}

impl Rasterizer for CpuRasterizer {
    #[tracing::instrument(skip_all, fields(elements = root.elements.len()))]
    fn to_raster(&mut self, root: &VisualTree, opts: &RasterOptions) -> CollageResult<FrameRGBA> {
        let (pw, ph) = self.output_size(root)?;
        if root.elements.iter().any(|e| e.caption().is_some()) {
            self.ensure_font()?;
        }

        let mut ctx = vello_cpu::RenderContext::new(pw, ph);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if let Some(clear) = opts.background_color.or(self.settings.clear_rgba) {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(solid(clear));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(pw),
                f64::from(ph),
            ));
        }

        let device = Affine::scale_non_uniform(
            f64::from(pw) / root.size.width,
            f64::from(ph) / root.size.height,
        ) * root.transform;

        // Nothing paints outside the container, whatever the view.
        let clip = root.container_rect();
        ctx.set_transform(affine_to_cpu(device));
        ctx.push_clip_layer(
            &vello_cpu::kurbo::Rect::new(clip.x0, clip.y0, clip.x1, clip.y1).to_path(0.1),
        );

        let mut used = HashSet::new();
        match &root.background {
            BackgroundPaint::Solid(c) => {
                ctx.set_transform(affine_to_cpu(device));
                ctx.set_paint(solid(*c));
                let r = root.container_rect();
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1));
            }
            BackgroundPaint::Cover(image) => {
                self.draw_cover(
                    &mut ctx,
                    device,
                    root.container_rect(),
                    image,
                    FilterStyle::None,
                    &mut used,
                )?;
            }
        }

        for el in &root.elements {
            self.draw_element(&mut ctx, device, el, &mut used)?;
        }
        ctx.pop_layer();

        self.paint_cache.retain(|k, _| used.contains(k));

        let mut pixmap = vello_cpu::Pixmap::new(pw, ph);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: u32::from(pw),
            height: u32::from(ph),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn solid(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn filtered(c: Rgba8, filter: FilterStyle) -> Rgba8 {
    let mut px = [c.r, c.g, c.b, c.a];
    apply_filter(&mut px, filter);
    let [r, g, b, a] = px;
    Rgba8 { r, g, b, a }
}

fn paint_edge(v: f64) -> u32 {
    if v.is_finite() {
        v.round().clamp(1.0, MAX_PAINT_EDGE) as u32
    } else {
        1
    }
}

/// Centre-crop `image` to the `width:height` aspect ratio and resample it to that size.
fn cover_resample(image: &PreparedImage, width: u32, height: u32) -> CollageResult<Vec<u8>> {
    let src = image.to_rgba_image()?;
    let (sw, sh) = (f64::from(image.width), f64::from(image.height));
    let target_aspect = f64::from(width) / f64::from(height);

    let (cw, ch) = if sw / sh > target_aspect {
        ((sh * target_aspect).round().max(1.0), sh)
    } else {
        (sw, (sw / target_aspect).round().max(1.0))
    };
    let (cw, ch) = ((cw as u32).min(image.width), (ch as u32).min(image.height));
    let x = (image.width - cw) / 2;
    let y = (image.height - ch) / 2;

    let cropped = image::imageops::crop_imm(&src, x, y, cw, ch).to_image();
    let resized = if (cw, ch) == (width, height) {
        cropped
    } else {
        image::imageops::resize(
            &cropped,
            width,
            height,
            image::imageops::FilterType::Triangle,
        )
    };
    Ok(resized.into_raw())
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> CollageResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CollageError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CollageError::validation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(CollageError::validation("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
