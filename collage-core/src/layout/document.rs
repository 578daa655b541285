use std::{fmt, path::Path};

use anyhow::Context;

use crate::foundation::{
    core::{ContainerSize, Rect, Rgba8},
    error::{CollageError, CollageResult},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Declarative collage arrangement produced by a layout generator.
///
/// The JSON shape is the generator's response document:
///
/// ```json
/// {
///   "container": { "width": 1000, "height": 800, "backgroundColor": "#111827" },
///   "images": [
///     { "width": "30%", "height": "40%", "top": "5%", "left": "10%", "rotation": -4, "zIndex": 2 }
///   ]
/// }
/// ```
pub struct LayoutDocument {
    /// Container size and background colour.
    pub container: Container,
    /// One box per source image, in source image order.
    pub images: Vec<ImageBox>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Collage container description.
pub struct Container {
    /// Logical width (only the aspect ratio is binding for display).
    pub width: f64,
    /// Logical height.
    pub height: f64,
    /// Hex colour string, e.g. `#1A202C`.
    pub background_color: String,
}

impl Container {
    /// Validated logical size.
    pub fn size(&self) -> CollageResult<ContainerSize> {
        ContainerSize::new(self.width, self.height)
    }

    /// Parsed background colour.
    pub fn background_rgba(&self) -> CollageResult<Rgba8> {
        Rgba8::from_hex(&self.background_color)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "ImageBoxDef", into = "ImageBoxDef")]
/// Declarative absolute box for one image.
pub struct ImageBox {
    /// Width as a percentage of the container width.
    pub width: Percent,
    /// Height as a percentage of the container height.
    pub height: Percent,
    /// Top offset as a percentage of the container height.
    pub top: Percent,
    /// Left offset as a percentage of the container width.
    pub left: Percent,
    /// Clockwise rotation in degrees around the box centre.
    pub rotation: f64,
    /// Stacking order; ties keep array order.
    pub z_index: i32,
    /// Plain photo or captioned card.
    pub frame: ImageFrame,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// How an image box is framed when composited.
pub enum ImageFrame {
    /// Photo with a uniform border.
    Plain,
    /// Card with a caption strip under the photo.
    Captioned(String),
}

impl ImageFrame {
    /// Caption text, when captioned.
    pub fn caption(&self) -> Option<&str> {
        match self {
            Self::Plain => None,
            Self::Captioned(text) => Some(text.as_str()),
        }
    }
}

impl ImageBox {
    /// Unrotated frame in container units.
    pub fn frame_rect(&self, container: ContainerSize) -> Rect {
        let x0 = self.left.of(container.width);
        let y0 = self.top.of(container.height);
        Rect::new(
            x0,
            y0,
            x0 + self.width.of(container.width),
            y0 + self.height.of(container.height),
        )
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageBoxDef {
    width: Percent,
    height: Percent,
    top: Percent,
    left: Percent,
    rotation: f64,
    #[serde(deserialize_with = "de_z_index")]
    z_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
}

impl From<ImageBoxDef> for ImageBox {
    fn from(def: ImageBoxDef) -> Self {
        Self {
            width: def.width,
            height: def.height,
            top: def.top,
            left: def.left,
            rotation: def.rotation,
            z_index: def.z_index,
            frame: match def.caption {
                Some(text) => ImageFrame::Captioned(text),
                None => ImageFrame::Plain,
            },
        }
    }
}

impl From<ImageBox> for ImageBoxDef {
    fn from(b: ImageBox) -> Self {
        Self {
            width: b.width,
            height: b.height,
            top: b.top,
            left: b.left,
            rotation: b.rotation,
            z_index: b.z_index,
            caption: match b.frame {
                ImageFrame::Plain => None,
                ImageFrame::Captioned(text) => Some(text),
            },
        }
    }
}

fn de_z_index<'de, D>(de: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let v = f64::deserialize(de)?;
    if !v.is_finite() || v < f64::from(i32::MIN) || v > f64::from(i32::MAX) {
        return Err(serde::de::Error::custom(format!(
            "zIndex {v} is not a representable integer"
        )));
    }
    Ok(v.round() as i32)
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
/// A CSS-style percentage such as `"30%"`.
pub struct Percent(f64);

impl Percent {
    /// Build from a percentage value (`30.0` means 30%).
    pub fn new(value: f64) -> CollageResult<Self> {
        if !value.is_finite() {
            return Err(CollageError::validation("percentage must be finite"));
        }
        Ok(Self(value))
    }

    /// Percentage value (`30.0` for `"30%"`).
    pub fn value(self) -> f64 {
        self.0
    }

    /// Resolve against a length.
    pub fn of(self, len: f64) -> f64 {
        len * self.0 / 100.0
    }

    /// Parse `"<number>%"`, tolerating surrounding whitespace.
    pub fn parse(s: &str) -> CollageResult<Self> {
        let t = s.trim();
        let num = t.strip_suffix('%').ok_or_else(|| {
            CollageError::validation(format!("expected a percentage like '30%', got '{t}'"))
        })?;
        let value: f64 = num.trim().parse().map_err(|_| {
            CollageError::validation(format!("expected a percentage like '30%', got '{t}'"))
        })?;
        Self::new(value)
    }
}

impl TryFrom<String> for Percent {
    type Error = CollageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Percent> for String {
    fn from(p: Percent) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathElem {
    Field(&'static str),
    Index(usize),
}

#[derive(Debug, Clone)]
struct LayoutIssue {
    path: Vec<PathElem>,
    message: String,
}

impl fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::from("$");
        for p in &self.path {
            match *p {
                PathElem::Field(name) => {
                    s.push('.');
                    s.push_str(name);
                }
                PathElem::Index(i) => {
                    s.push('[');
                    s.push_str(&i.to_string());
                    s.push(']');
                }
            }
        }
        write!(f, "{s}: {}", self.message)
    }
}

impl LayoutDocument {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> CollageResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a document from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> CollageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read layout document '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> CollageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate against the number of source images it will be paired with.
    ///
    /// A document that fails validation must be discarded in full.
    pub fn validate(&self, source_images: usize) -> CollageResult<()> {
        if self.images.len() != source_images {
            return Err(CollageError::validation(format!(
                "layout has {} image boxes but {} source images were provided",
                self.images.len(),
                source_images
            )));
        }

        let mut issues = Vec::<LayoutIssue>::new();
        let container = [PathElem::Field("container")];
        let mut at = |path: &[PathElem], message: String| {
            issues.push(LayoutIssue {
                path: path.to_vec(),
                message,
            });
        };

        if let Err(e) = self.container.size() {
            at(&container, message_of(e));
        }
        if let Err(e) = self.container.background_rgba() {
            at(
                &[PathElem::Field("container"), PathElem::Field("backgroundColor")],
                message_of(e),
            );
        }

        for (i, b) in self.images.iter().enumerate() {
            let base = [PathElem::Field("images"), PathElem::Index(i)];
            let field = |name: &'static str| {
                let mut p = base.to_vec();
                p.push(PathElem::Field(name));
                p
            };
            if b.width.value() < 0.0 {
                at(&field("width"), "must not be negative".to_string());
            }
            if b.height.value() < 0.0 {
                at(&field("height"), "must not be negative".to_string());
            }
            if !b.rotation.is_finite() {
                at(&field("rotation"), "must be finite".to_string());
            }
        }

        if issues.is_empty() {
            return Ok(());
        }
        let joined = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(CollageError::validation(joined))
    }

    /// Indices into `images` in paint order: ascending `zIndex`, ties keep array order.
    pub fn paint_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.images.len()).collect();
        order.sort_by_key(|&i| self.images[i].z_index);
        order
    }
}

fn message_of(e: CollageError) -> String {
    match e {
        CollageError::Validation(m) => m,
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/document.rs"]
mod tests;
