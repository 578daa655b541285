use super::*;

const RESPONSE: &str = r##"
  {
    "container": { "width": 1200, "height": 900, "backgroundColor": "#ffeedd" },
    "images": [
      { "width": "40%", "height": "45%", "top": "5%", "left": "5%", "rotation": 0, "zIndex": 1 },
      { "width": "40%", "height": "45%", "top": "5%", "left": "55%", "rotation": 0, "zIndex": 2 }
    ]
  }
"##;

fn request(n: usize) -> LayoutRequest {
    LayoutRequest {
        images: (0..n)
            .map(|i| InlineImage {
                mime: "image/png",
                bytes: Arc::new(vec![i as u8]),
            })
            .collect(),
        style: CollageStyle::Grid,
        background_color: "#ffeedd".to_string(),
    }
}

#[test]
fn styles_parse_case_insensitively() {
    assert_eq!("polaroid".parse::<CollageStyle>().unwrap(), CollageStyle::Polaroid);
    assert_eq!(" GRID ".parse::<CollageStyle>().unwrap(), CollageStyle::Grid);
    assert_eq!(CollageStyle::default(), CollageStyle::Dynamic);
    assert!("Cubist".parse::<CollageStyle>().is_err());
}

#[test]
fn collage_prompt_carries_count_style_and_colour() {
    let prompt = collage_prompt(3, CollageStyle::Grid, "#ffeedd");
    assert_eq!(request(3).prompt(), prompt);
    assert!(prompt.contains("using 3 provided images"));
    assert!(prompt.contains("**Style Guideline: Grid**"));
    assert!(prompt.contains(CollageStyle::Grid.instructions()));
    assert!(prompt.contains("MUST contain exactly 3 items"));
    assert!(prompt.contains("The background color of the collage MUST be \"#ffeedd\"."));
    assert!(!prompt.contains("  "), "line continuations must not leak indentation");
}

#[test]
fn background_prompt_wraps_the_style_text() {
    let p = background_prompt("  misty forest at dawn ");
    assert!(p.starts_with("A beautiful, aesthetically pleasing background image"));
    assert!(p.contains("Style: misty forest at dawn. The image"));
    assert!(p.ends_with("Avoid text or prominent figures."));
}

#[test]
fn schema_requires_the_document_fields() {
    let schema = layout_response_schema();
    assert_eq!(schema["required"], serde_json::json!(["container", "images"]));
    assert_eq!(
        schema["properties"]["images"]["items"]["required"],
        serde_json::json!(["width", "height", "top", "left", "rotation", "zIndex"])
    );
    assert!(schema["properties"]["images"]["items"]["properties"]["caption"].is_object());
}

#[test]
fn responses_are_trimmed_parsed_and_counted() {
    let doc = parse_layout_response(RESPONSE, 2).unwrap();
    assert_eq!(doc.container.background_color, "#ffeedd");

    let err = parse_layout_response(RESPONSE, 3).unwrap_err();
    assert!(matches!(err, CollageError::Validation(_)));

    let err = parse_layout_response("{ not json", 2).unwrap_err();
    assert!(matches!(err, CollageError::Serde(_)));
}

#[test]
fn file_generator_reads_and_validates() {
    let path = std::env::temp_dir().join(format!("collage-layout-{}.json", std::process::id()));
    std::fs::write(&path, RESPONSE).unwrap();

    let mut generator = FileLayoutGenerator::new(&path);
    let doc = generator.generate(&request(2)).unwrap();
    assert_eq!(doc.images.len(), 2);
    assert!(generator.generate(&request(1)).is_err());

    std::fs::remove_file(&path).unwrap();
    let err = generator.generate(&request(2)).unwrap_err();
    assert!(matches!(err, CollageError::Generation(_)), "{err}");
}
