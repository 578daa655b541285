use std::io::Cursor;

use super::*;
use crate::assets::background::Background;

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn add_keeps_order_and_issues_previews() {
    let ledger = PreviewLedger::new();
    let mut images = ImageCollection::new(ledger.clone());
    let a = images.add("a.png", png(4, 2, [255, 0, 0, 255])).unwrap();
    let b = images.add("b.png", png(1, 1, [0, 255, 0, 255])).unwrap();

    assert_eq!(ledger.live(), 2);
    let names: Vec<&str> = images.iter().map(|i| i.name()).collect();
    assert_eq!(names, vec!["a.png", "b.png"]);
    assert_ne!(a, b);

    let first = images.get(a).unwrap();
    assert_eq!(first.mime(), "image/png");
    assert_eq!(first.pixels().width, 4);
    assert!(first.preview_url().starts_with("preview://"));
    assert_eq!(first.filter(), FilterStyle::None);
}

#[test]
fn remove_and_replace_release_previews_once() {
    let ledger = PreviewLedger::new();
    let mut images = ImageCollection::new(ledger.clone());
    let a = images.add("a.png", png(2, 2, [1, 2, 3, 255])).unwrap();
    let b = images.add("b.png", png(2, 2, [4, 5, 6, 255])).unwrap();

    let old_url = images.get(b).unwrap().preview_url();
    images.set_filter(b, FilterStyle::Sepia).unwrap();
    images.replace(b, png(3, 3, [7, 8, 9, 255])).unwrap();
    assert_eq!(ledger.live(), 2);
    let replaced = images.get(b).unwrap();
    assert_ne!(replaced.preview_url(), old_url);
    assert_eq!(replaced.pixels().width, 3);
    assert_eq!(replaced.filter(), FilterStyle::Sepia);

    assert!(images.remove(a));
    assert!(!images.remove(a));
    assert_eq!(ledger.live(), 1);

    drop(images);
    assert_eq!(ledger.live(), 0);
}

#[test]
fn rejected_uploads_leave_collection_untouched() {
    let ledger = PreviewLedger::new();
    let mut images = ImageCollection::new(ledger.clone());
    let a = images.add("a.png", png(2, 2, [1, 2, 3, 255])).unwrap();

    assert!(images.add("junk.bin", b"junk".to_vec()).is_err());
    assert!(images.replace(a, b"junk".to_vec()).is_err());
    assert_eq!(images.len(), 1);
    assert_eq!(ledger.live(), 1);
    assert!(images.set_filter(ImageId(999), FilterStyle::Invert).is_err());
}

#[test]
fn filter_names_parse() {
    assert_eq!("Grayscale".parse::<FilterStyle>().unwrap(), FilterStyle::Grayscale);
    assert_eq!(" sepia ".parse::<FilterStyle>().unwrap(), FilterStyle::Sepia);
    assert!("blur".parse::<FilterStyle>().is_err());
    assert_eq!(
        serde_json::to_string(&FilterStyle::Invert).unwrap(),
        "\"invert\""
    );
}

#[test]
fn background_handles_are_released_when_superseded() {
    let ledger = PreviewLedger::new();
    let mut bg = Background::default();
    assert_eq!(bg.kind(), "color");
    assert_eq!(bg.color().unwrap().to_string(), "#111827");

    bg = Background::uploaded(&ledger, "bg.png", &png(8, 8, [9, 9, 9, 255])).unwrap();
    assert_eq!(ledger.live(), 1);
    assert!(bg.preview_url().is_some());

    bg = Background::generated(&ledger, "watercolor", &png(8, 8, [1, 1, 1, 255])).unwrap();
    assert_eq!(ledger.live(), 1);
    assert_eq!(bg.kind(), "generated");

    bg = Background::default();
    assert_eq!(ledger.live(), 0);
    assert!(bg.image().is_none());
}
