//! Colour filters with the semantics of the CSS `grayscale(100%)`, `sepia(100%)` and
//! `invert(100%)` filter functions, applied to straight-alpha RGBA8.

use crate::{assets::collection::FilterStyle, foundation::math::clamp_u8};

const GRAYSCALE: [[f32; 3]; 3] = [
    [0.2126, 0.7152, 0.0722],
    [0.2126, 0.7152, 0.0722],
    [0.2126, 0.7152, 0.0722],
];

const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Apply `filter` in place; alpha is untouched.
pub fn apply_filter(rgba8: &mut [u8], filter: FilterStyle) {
    match filter {
        FilterStyle::None => {}
        FilterStyle::Grayscale => apply_matrix(rgba8, &GRAYSCALE),
        FilterStyle::Sepia => apply_matrix(rgba8, &SEPIA),
        FilterStyle::Invert => {
            for px in rgba8.chunks_exact_mut(4) {
                px[0] = 255 - px[0];
                px[1] = 255 - px[1];
                px[2] = 255 - px[2];
            }
        }
    }
}

fn apply_matrix(rgba8: &mut [u8], m: &[[f32; 3]; 3]) {
    for px in rgba8.chunks_exact_mut(4) {
        let (r, g, b) = (f32::from(px[0]), f32::from(px[1]), f32::from(px[2]));
        for (c, row) in px[..3].iter_mut().zip(m) {
            *c = clamp_u8(row[0] * r + row[1] * g + row[2] * b);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/filter.rs"]
mod tests;
