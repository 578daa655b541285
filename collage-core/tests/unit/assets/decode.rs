use std::io::Cursor;

use super::*;

fn encode(img: image::RgbaImage, format: image::ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_straight_alpha() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50u8, 200u8, 128u8]).unwrap();
    let prepared = decode_image(&encode(img, image::ImageFormat::Png)).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(prepared.rgba8.as_slice(), &[100, 50, 200, 128]);
}

#[test]
fn sniff_mime_accepts_png_and_rejects_others() {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
    assert_eq!(
        sniff_mime(&encode(img.clone(), image::ImageFormat::Png)).unwrap(),
        "image/png"
    );
    let bmp = encode(img, image::ImageFormat::Bmp);
    assert!(sniff_mime(&bmp).is_err());
    assert!(decode_image(&bmp).is_err());
    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn from_rgba8_checks_lengths() {
    assert!(PreparedImage::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(PreparedImage::from_rgba8(0, 2, vec![]).is_err());
    PreparedImage::from_rgba8(2, 1, vec![0; 8]).unwrap();
}
