use super::*;

fn doc_json(boxes: &str) -> String {
    format!(
        r##"{{
  "container": {{ "width": 1000, "height": 800, "backgroundColor": "#1A202C" }},
  "images": [{boxes}]
}}"##
    )
}

const BOX_A: &str =
    r#"{ "width": "30%", "height": "40%", "top": "5%", "left": "10%", "rotation": -4, "zIndex": 3 }"#;
const BOX_B: &str = r#"{ "width": "25%", "height": "25%", "top": "50%", "left": "-5%", "rotation": 12.5, "zIndex": 1, "caption": "Fun times" }"#;

#[test]
fn parses_wire_format_into_tagged_frames() {
    let doc = LayoutDocument::from_json(&doc_json(&format!("{BOX_A},{BOX_B}"))).unwrap();
    assert_eq!(doc.container.width, 1000.0);
    assert_eq!(doc.images.len(), 2);
    assert_eq!(doc.images[0].frame, ImageFrame::Plain);
    assert_eq!(
        doc.images[1].frame,
        ImageFrame::Captioned("Fun times".to_string())
    );
    assert_eq!(doc.images[1].left.value(), -5.0);
    assert_eq!(doc.images[0].z_index, 3);
    doc.validate(2).unwrap();
}

#[test]
fn serialization_omits_caption_for_plain_boxes() {
    let doc = LayoutDocument::from_json(&doc_json(&format!("{BOX_A},{BOX_B}"))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
    assert!(json["images"][0].get("caption").is_none());
    assert_eq!(json["images"][1]["caption"], "Fun times");
    assert_eq!(json["images"][0]["width"], "30%");
    assert_eq!(json["container"]["backgroundColor"], "#1A202C");
}

#[test]
fn fractional_z_index_is_rounded() {
    let b = r#"{ "width": "10%", "height": "10%", "top": "0%", "left": "0%", "rotation": 0, "zIndex": 2.0 }"#;
    let doc = LayoutDocument::from_json(&doc_json(b)).unwrap();
    assert_eq!(doc.images[0].z_index, 2);
}

#[test]
fn non_percentage_strings_are_rejected() {
    let b = r#"{ "width": "30px", "height": "10%", "top": "0%", "left": "0%", "rotation": 0, "zIndex": 1 }"#;
    let err = LayoutDocument::from_json(&doc_json(b)).unwrap_err();
    assert!(matches!(err, CollageError::Serde(_)));
    assert!(err.to_string().contains("percentage"));
}

#[test]
fn count_mismatch_is_a_validation_error() {
    let doc = LayoutDocument::from_json(&doc_json(BOX_A)).unwrap();
    let err = doc.validate(3).unwrap_err();
    assert!(matches!(err, CollageError::Validation(_)));
    assert!(err.to_string().contains("1 image boxes but 3 source images"));
}

#[test]
fn semantic_issues_report_json_paths() {
    let b = r#"{ "width": "-30%", "height": "10%", "top": "0%", "left": "0%", "rotation": 0, "zIndex": 1 }"#;
    let mut doc = LayoutDocument::from_json(&doc_json(b)).unwrap();
    doc.container.background_color = "teal".to_string();
    let msg = doc.validate(1).unwrap_err().to_string();
    assert!(msg.contains("$.images[0].width: must not be negative"), "{msg}");
    assert!(msg.contains("$.container.backgroundColor"), "{msg}");

    doc.container.width = 0.0;
    let msg = doc.validate(1).unwrap_err().to_string();
    assert!(msg.contains("$.container: container width"), "{msg}");
}

#[test]
fn paint_order_is_stable_by_z_index() {
    let boxes = [3, 1, 3, 2]
        .iter()
        .map(|z| {
            format!(
                r#"{{ "width": "10%", "height": "10%", "top": "0%", "left": "0%", "rotation": 0, "zIndex": {z} }}"#
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    let doc = LayoutDocument::from_json(&doc_json(&boxes)).unwrap();
    assert_eq!(doc.paint_order(), vec![1, 3, 0, 2]);
}

#[test]
fn frame_rect_resolves_percentages_against_container() {
    let doc = LayoutDocument::from_json(&doc_json(BOX_A)).unwrap();
    let size = doc.container.size().unwrap();
    let r = doc.images[0].frame_rect(size);
    assert_eq!(r, Rect::new(100.0, 40.0, 400.0, 360.0));
}

#[test]
fn percent_parse_tolerates_whitespace() {
    assert_eq!(Percent::parse(" 12.5 % ").unwrap().value(), 12.5);
    assert!(Percent::parse("%").is_err());
    assert!(Percent::parse("abc%").is_err());
    assert_eq!(Percent::new(30.0).unwrap().to_string(), "30%");
}
