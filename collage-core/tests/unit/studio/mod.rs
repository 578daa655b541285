use std::io::Cursor;

use super::*;
use crate::{
    assets::text::CaptionFontSource,
    foundation::core::{Affine, Point, Vec2},
    render::{backend::RenderSettings, cpu::CpuRasterizer},
};

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn grid_doc(n: usize, bg: &str) -> LayoutDocument {
    let boxes = (0..n)
        .map(|i| {
            format!(
                r#"{{ "width": "30%", "height": "80%", "top": "10%", "left": "{}%", "rotation": 0, "zIndex": {} }}"#,
                2 + i * 33,
                i + 1
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    LayoutDocument::from_json(&format!(
        r#"{{ "container": {{ "width": 90, "height": 60, "backgroundColor": "{bg}" }}, "images": [{boxes}] }}"#
    ))
    .unwrap()
}

/// Returns a canned document (or error) and records what it was asked.
struct Canned {
    reply: Option<LayoutDocument>,
    requests: Vec<(usize, CollageStyle, String)>,
}

impl Canned {
    fn ok(doc: LayoutDocument) -> Self {
        Self {
            reply: Some(doc),
            requests: Vec::new(),
        }
    }

    fn failing() -> Self {
        Self {
            reply: None,
            requests: Vec::new(),
        }
    }
}

impl LayoutGenerator for Canned {
    fn generate(&mut self, request: &LayoutRequest) -> CollageResult<LayoutDocument> {
        self.requests.push((
            request.images.len(),
            request.style,
            request.background_color.clone(),
        ));
        self.reply
            .clone()
            .ok_or_else(|| CollageError::generation("service unavailable"))
    }
}

struct Painter(Option<Vec<u8>>);

impl BackgroundGenerator for Painter {
    fn generate(&mut self, prompt: &str) -> CollageResult<Vec<u8>> {
        assert!(prompt.contains("Style: "));
        self.0
            .clone()
            .ok_or_else(|| CollageError::generation("no image returned"))
    }
}

fn studio_with(n: usize) -> CollageStudio {
    let mut studio = CollageStudio::new();
    for i in 0..n {
        let shade = (40 * i) as u8;
        studio
            .add_image(&format!("{i}.png"), png(6, 4, [shade, 100, 200, 255]))
            .unwrap();
    }
    studio
}

fn cpu() -> CpuRasterizer {
    CpuRasterizer::new(RenderSettings {
        caption_font: CaptionFontSource::Disabled,
        ..RenderSettings::default()
    })
}

fn zoom_in_at(studio: &mut CollageStudio, x: f64, y: f64) {
    studio.handle_viewport(ViewportEvent::Wheel {
        delta_y: -1.0,
        cursor: Point::new(x, y),
    });
}

#[test]
fn fewer_than_two_images_is_rejected_before_asking() {
    let mut studio = studio_with(1);
    let mut generator = Canned::ok(grid_doc(1, "#000000"));
    let err = studio.generate_collage(&mut generator).unwrap_err();
    assert!(matches!(err, CollageError::Validation(_)));
    assert!(generator.requests.is_empty());
}

#[test]
fn request_carries_images_style_and_colour_hint() {
    let mut studio = studio_with(2);
    studio.set_style(CollageStyle::Polaroid);
    let mut generator = Canned::ok(grid_doc(2, "#abcdef"));
    studio.generate_collage(&mut generator).unwrap();
    assert_eq!(
        generator.requests,
        vec![(2, CollageStyle::Polaroid, "#111827".to_string())]
    );
    // Colour backgrounds adopt the document's colour.
    assert_eq!(studio.background().color(), Some(Rgba8::opaque(0xab, 0xcd, 0xef)));

    studio.set_background_image("bg.png", &png(2, 2, [0, 0, 0, 255])).unwrap();
    studio.generate_collage(&mut generator).unwrap();
    assert_eq!(generator.requests[1].2, "#111827");
    assert!(studio.background().color().is_none());
}

#[test]
fn mismatched_document_changes_nothing() {
    let mut studio = studio_with(3);
    studio.generate_collage(&mut Canned::ok(grid_doc(3, "#222222"))).unwrap();
    zoom_in_at(&mut studio, 10.0, 10.0);
    let view = studio.view_state();
    let installed = studio.layout().cloned();
    let transform = studio.visual_tree().unwrap().transform;

    let err = studio
        .generate_collage(&mut Canned::ok(grid_doc(2, "#ffffff")))
        .unwrap_err();
    assert!(matches!(err, CollageError::Validation(_)));
    assert_eq!(studio.view_state(), view);
    assert_eq!(studio.layout().cloned(), installed);
    assert_eq!(studio.visual_tree().unwrap().transform, transform);
    assert_eq!(studio.background().color(), Some(Rgba8::opaque(0x22, 0x22, 0x22)));

    let err = studio.generate_collage(&mut Canned::failing()).unwrap_err();
    assert!(matches!(err, CollageError::Generation(_)));
    assert_eq!(studio.view_state(), view);
}

#[test]
fn successful_generation_resets_the_view() {
    let mut studio = studio_with(2);
    zoom_in_at(&mut studio, 30.0, 20.0);
    assert_ne!(studio.view_state(), ViewState::IDENTITY);
    studio.generate_collage(&mut Canned::ok(grid_doc(2, "#333333"))).unwrap();
    assert_eq!(studio.view_state(), ViewState::IDENTITY);
    assert_eq!(studio.visual_tree().unwrap().transform, Affine::IDENTITY);
}

#[test]
fn viewport_events_reach_the_root() {
    let mut studio = studio_with(2);
    studio.generate_collage(&mut Canned::ok(grid_doc(2, "#333333"))).unwrap();
    studio.handle_viewport(ViewportEvent::PointerDown(Point::new(5.0, 5.0)));
    studio.handle_viewport(ViewportEvent::PointerMove(Point::new(9.0, 2.0)));
    studio.handle_viewport(ViewportEvent::PointerLeave);
    studio.handle_viewport(ViewportEvent::PointerMove(Point::new(50.0, 50.0)));
    assert_eq!(studio.view_state().translation, Vec2::new(4.0, -3.0));
    assert_eq!(
        studio.visual_tree().unwrap().transform,
        studio.view_state().to_affine()
    );
    studio.reset_view();
    assert_eq!(studio.visual_tree().unwrap().transform, Affine::IDENTITY);
}

#[test]
fn image_set_changes_discard_layout_but_filters_do_not() {
    let mut studio = studio_with(2);
    studio.generate_collage(&mut Canned::ok(grid_doc(2, "#333333"))).unwrap();

    let first = studio.images().as_slice()[0].id();
    studio.set_filter(first, FilterStyle::Grayscale).unwrap();
    assert!(studio.layout().is_some());
    assert_eq!(
        studio.visual_tree().unwrap().elements[0].filter,
        FilterStyle::Grayscale
    );

    studio.add_image("extra.png", png(2, 2, [9, 9, 9, 255])).unwrap();
    assert!(studio.layout().is_none());
    assert!(studio.visual_tree().is_none());

    studio.generate_collage(&mut Canned::ok(grid_doc(3, "#333333"))).unwrap();
    assert!(studio.remove_image(first));
    assert!(studio.layout().is_none());
    assert!(!studio.remove_image(first));
}

#[test]
fn backgrounds_release_previews_when_replaced() {
    let mut studio = studio_with(2);
    let ledger = Arc::clone(studio.ledger());
    assert_eq!(ledger.live(), 2);

    studio.set_background_image("bg.png", &png(3, 3, [1, 1, 1, 255])).unwrap();
    assert_eq!(ledger.live(), 3);

    let mut painter = Painter(Some(png(4, 4, [7, 7, 7, 255])));
    studio.generate_background("sunset beach", &mut painter).unwrap();
    assert_eq!(ledger.live(), 3);
    assert_eq!(studio.background().kind(), "generated");

    studio.set_background_color("#ff00ff").unwrap();
    assert_eq!(ledger.live(), 2);
    studio.clear_background();
    assert_eq!(studio.background().color(), Some(default_background_color()));
}

#[test]
fn background_generation_failures_keep_the_old_background() {
    let mut studio = studio_with(2);
    let err = studio
        .generate_background("   ", &mut Painter(Some(png(1, 1, [0; 4]))))
        .unwrap_err();
    assert!(matches!(err, CollageError::Generation(_)));

    let err = studio
        .generate_background("clouds", &mut Painter(Some(b"not an image".to_vec())))
        .unwrap_err();
    assert!(matches!(err, CollageError::Generation(_)));

    let err = studio
        .generate_background("clouds", &mut Painter(None))
        .unwrap_err();
    assert!(matches!(err, CollageError::Generation(_)));
    assert_eq!(studio.background().color(), Some(default_background_color()));
}

#[test]
fn export_without_collage_is_an_export_error() {
    let mut studio = studio_with(2);
    let err = studio.export(ExportFormat::Png, &mut cpu()).unwrap_err();
    assert!(matches!(err, CollageError::Export(_)));
}

#[test]
fn grid_export_is_unaffected_by_zoom_then_reset() {
    let mut studio = studio_with(3);
    studio.set_style(CollageStyle::Grid);
    studio.generate_collage(&mut Canned::ok(grid_doc(3, "#101010"))).unwrap();

    let tree = studio.visual_tree().unwrap();
    assert_eq!(tree.paint_order(), vec![0, 1, 2]);
    assert!(tree.elements.iter().all(|e| e.rotation_deg == 0.0));

    let mut r = cpu();
    let before = studio.export(ExportFormat::Png, &mut r).unwrap();
    assert_eq!(before.file_name, "ai-collage.png");

    zoom_in_at(&mut studio, 45.0, 30.0);
    zoom_in_at(&mut studio, 10.0, 50.0);
    let zoomed_view = studio.view_state();
    let while_zoomed = studio.export(ExportFormat::Png, &mut r).unwrap();
    assert_eq!(studio.view_state(), zoomed_view);
    assert_eq!(
        studio.visual_tree().unwrap().transform,
        zoomed_view.to_affine()
    );

    studio.reset_view();
    let after = studio.export(ExportFormat::Png, &mut r).unwrap();
    assert_eq!(before, after);
    assert_eq!(before, while_zoomed);
}

#[test]
fn snapshot_shows_the_live_view() {
    let mut studio = studio_with(2);
    studio.generate_collage(&mut Canned::ok(grid_doc(2, "#101010"))).unwrap();
    let mut r = cpu();
    let flat = studio.snapshot(&mut r).unwrap();
    zoom_in_at(&mut studio, 0.0, 0.0);
    let zoomed = studio.snapshot(&mut r).unwrap();
    assert_eq!((flat.width, flat.height), (zoomed.width, zoomed.height));
    assert_ne!(flat.data, zoomed.data);
}

#[test]
fn snapshot_clips_to_the_container() {
    let mut studio = studio_with(2);
    let doc = LayoutDocument::from_json(
        r##"{ "container": { "width": 90, "height": 60, "backgroundColor": "#101010" },
              "images": [
                { "width": "30%", "height": "50%", "top": "10%", "left": "5%", "rotation": 0, "zIndex": 1 },
                { "width": "50%", "height": "50%", "top": "10%", "left": "80%", "rotation": 0, "zIndex": 2 }
              ] }"##,
    )
    .unwrap();
    studio.generate_collage(&mut Canned::ok(doc)).unwrap();
    for _ in 0..7 {
        studio.handle_viewport(ViewportEvent::Wheel {
            delta_y: 1.0,
            cursor: Point::new(0.0, 0.0),
        });
    }
    let scale = studio.view_state().scale;
    let right_edge = 90.0 * scale;

    let mut r = cpu();
    let live = studio.snapshot(&mut r).unwrap();
    let outside = (right_edge + 3.0).ceil() as u32;
    assert_eq!(live.pixel(outside, 15), Some([0, 0, 0, 0]));
    assert_eq!(
        live.pixel((right_edge - 3.0) as u32, 25),
        Some([0x10, 0x10, 0x10, 255])
    );
}
