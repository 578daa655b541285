use std::{fmt, str::FromStr};

use crate::foundation::error::{CollageError, CollageResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Logical size of the collage container (only the aspect ratio is binding).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> CollageResult<Self> {
        if !width.is_finite() || width <= 0.0 {
            return Err(CollageError::validation(
                "container width must be finite and > 0",
            ));
        }
        if !height.is_finite() || height <= 0.0 {
            return Err(CollageError::validation(
                "container height must be finite and > 0",
            ));
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(self) -> f64 {
        self.width / self.height
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Straight (non-premultiplied) RGBA8 colour, parsed from CSS-style hex strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> CollageResult<Self> {
        let raw = s.trim();
        let hex = raw
            .strip_prefix('#')
            .ok_or_else(|| CollageError::validation(format!("colour '{raw}' must start with '#'")))?;
        if !hex.is_ascii() {
            return Err(CollageError::validation(format!(
                "colour '{raw}' is not a hex colour"
            )));
        }

        let nibble = |c: u8| -> CollageResult<u8> {
            (c as char)
                .to_digit(16)
                .map(|v| v as u8)
                .ok_or_else(|| CollageError::validation(format!("colour '{raw}' is not a hex colour")))
        };
        let byte = |i: usize| -> CollageResult<u8> {
            let b = hex.as_bytes();
            Ok(nibble(b[i])? << 4 | nibble(b[i + 1])?)
        };

        match hex.len() {
            3 => {
                let b = hex.as_bytes();
                let (r, g, bl) = (nibble(b[0])?, nibble(b[1])?, nibble(b[2])?);
                Ok(Self::opaque(r * 17, g * 17, bl * 17))
            }
            6 => Ok(Self::opaque(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(CollageError::validation(format!(
                "colour '{raw}' must have 3, 6 or 8 hex digits"
            ))),
        }
    }

    pub fn premultiplied(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

impl fmt::Display for Rgba8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Rgba8 {
    type Err = CollageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
