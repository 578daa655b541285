use std::{fmt, str::FromStr};

use crate::foundation::error::CollageError;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
/// Arrangement style requested from the layout generator.
pub enum CollageStyle {
    Minimal,
    #[default]
    Dynamic,
    Overlap,
    Grid,
    Polaroid,
}

impl CollageStyle {
    pub const ALL: [Self; 5] = [
        Self::Minimal,
        Self::Dynamic,
        Self::Overlap,
        Self::Grid,
        Self::Polaroid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "Minimal",
            Self::Dynamic => "Dynamic",
            Self::Overlap => "Overlap",
            Self::Grid => "Grid",
            Self::Polaroid => "Polaroid",
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            Self::Minimal => {
                "Arrange the images in a clean, minimalist style with minimal overlap, straight \
                 angles (0-2 degrees rotation), and balanced spacing."
            }
            Self::Dynamic => {
                "Create a dynamic and energetic layout. Use a variety of rotations (between -15 \
                 and 15 degrees) and artistic overlaps to create a sense of movement and depth."
            }
            Self::Overlap => {
                "Create a heavily layered and overlapping collage, like a scrapbook. Focus on \
                 creating depth by stacking many images on top of each other with significant \
                 rotation and varied z-indexes."
            }
            Self::Grid => {
                "Arrange the images in a simple, uniform grid layout. The grid can have varying \
                 numbers of rows and columns. All images should be perfectly aligned with no \
                 rotation and minimal, consistent spacing between them."
            }
            Self::Polaroid => {
                "Arrange the images to look like scattered Polaroid photos. Each image should \
                 have a thick white border with a larger bottom margin for a caption. Suggest a \
                 short, fun, one or two-word caption for each photo based on its content. \
                 Include slight, varied rotations for a candid, scattered look."
            }
        }
    }
}

impl fmt::Display for CollageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollageStyle {
    type Err = CollageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                CollageError::validation(format!(
                    "unknown collage style '{wanted}'; expected one of Minimal, Dynamic, Overlap, Grid, Polaroid"
                ))
            })
    }
}

/// Designer prompt sent alongside the encoded images.
pub fn collage_prompt(image_count: usize, style: CollageStyle, color: &str) -> String {
    format!(
        "\nYou are an expert collage designer. Your task is to create an aesthetically pleasing collage layout using {image_count} provided images.\n\
         \n\
         **Style Guideline: {style}**\n\
         {instructions}\n\
         \n\
         **Background Color Guideline:**\n\
         Use the user-provided background color: \"{color}\". This color MUST be used for the 'backgroundColor' field in your response.\n\
         \n\
         The collage container will have a specific width and height. All image positions and dimensions should be relative to this container, expressed in percentages for responsiveness.\n\
         \n\
         **Caption Guideline (for Polaroid style only):**\n\
         If the style is 'Polaroid', you MUST generate a short, fun, one or two-word caption for each photo based on its visual content and include it in the 'caption' field. For all other styles, the 'caption' field should be omitted.\n\
         \n\
         Please return a JSON object that strictly adheres to the provided schema. The output should only be the JSON object.\n\
         - The 'images' array in your response MUST contain exactly {image_count} items, corresponding to the input images in their original order.\n\
         - Ensure all images are mostly visible within the container bounds.\n\
         - The background color of the collage MUST be \"{color}\".\n",
        instructions = style.instructions(),
    )
}

/// Prompt for a generated background image.
pub fn background_prompt(style_text: &str) -> String {
    format!(
        "A beautiful, aesthetically pleasing background image for a photo collage. Style: {}. \
         The image should be visually interesting but not distracting. Avoid text or prominent figures.",
        style_text.trim()
    )
}

/// JSON schema a generator response must follow.
pub fn layout_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "container": {
                "type": "object",
                "properties": {
                    "width": { "type": "number", "description": "The width of the collage container in pixels, e.g., 1000." },
                    "height": { "type": "number", "description": "The height of the collage container in pixels, e.g., 1000." },
                    "backgroundColor": { "type": "string", "description": "A hex code for the background color, e.g., #1A202C." }
                },
                "required": ["width", "height", "backgroundColor"]
            },
            "images": {
                "type": "array",
                "description": "An array of image layout objects, one for each input image in the order they were provided.",
                "items": {
                    "type": "object",
                    "properties": {
                        "width": { "type": "string", "description": "The width of the image as a percentage of the container width (e.g., '30%')." },
                        "height": { "type": "string", "description": "The height of the image as a percentage of the container height (e.g., '40%')." },
                        "top": { "type": "string", "description": "The top position as a percentage of the container height (e.g., '10%')." },
                        "left": { "type": "string", "description": "The left position as a percentage of the container width (e.g., '5%')." },
                        "rotation": { "type": "number", "description": "The rotation in degrees (e.g., -5, 10)." },
                        "zIndex": { "type": "number", "description": "The stacking order (e.g., 1, 2, 3)." },
                        "caption": { "type": "string", "description": "An optional short caption for the image, especially for the Polaroid style (e.g., 'Fun times')." }
                    },
                    "required": ["width", "height", "top", "left", "rotation", "zIndex"]
                }
            }
        },
        "required": ["container", "images"]
    })
}
