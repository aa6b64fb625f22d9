mod common;

use pressproof::page_boxes::{apply_page_geometry, PageGeometry};
use pressproof::pdf::PdfDocument;

fn rectangle(dictionary: &lopdf::Dictionary, key: &[u8]) -> [f64; 4] {
    let corners = dictionary.get(key).unwrap().as_array().unwrap();
    let mut rectangle = [0.0; 4];
    for (slot, corner) in rectangle.iter_mut().zip(corners) {
        *slot = match corner {
            lopdf::Object::Integer(value) => *value as f64,
            lopdf::Object::Real(value) => *value as f64,
            other => panic!("expected a number in the rectangle, found {:?}", other),
        };
    }
    rectangle
}

fn assert_rectangle_eq(actual: [f64; 4], expected: [f64; 4]) {
    for (actual, expected) in actual.iter().zip(expected) {
        assert!(
            (actual - expected).abs() < 0.01,
            "rectangle mismatch: {:?} != {:?}",
            actual,
            expected
        );
    }
}

#[test]
fn spurious_trailing_page_is_removed_and_boxes_are_set() {
    // Three rendered pages but geometry for two: the renderer appended one
    // blank page too many
    let bytes = common::build_rendered_document(&["q Q", "q Q", ""]);
    let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();
    let geometry = vec![
        PageGeometry {
            media_width: 500.0,
            media_height: 700.0,
            bleed_offset: 10.0,
            bleed_size: 5.0,
        },
        PageGeometry {
            media_width: 500.0,
            media_height: 700.0,
            bleed_offset: 0.0,
            bleed_size: 0.0,
        },
    ];
    apply_page_geometry(&mut pdf, &geometry).unwrap();

    let page_ids = pdf.page_ids();
    assert_eq!(page_ids.len(), 2);

    // The page tree height is 842, so a 700 media height floats to the top
    let first_page = pdf.inner_document.get_dictionary(page_ids[0]).unwrap();
    assert_rectangle_eq(rectangle(first_page, b"MediaBox"), [0.0, 142.0, 500.0, 842.0]);
    assert_rectangle_eq(rectangle(first_page, b"BleedBox"), [10.0, 152.0, 490.0, 832.0]);
    assert_rectangle_eq(rectangle(first_page, b"TrimBox"), [15.0, 157.0, 485.0, 827.0]);

    // Zero bleed stops after the media box
    let second_page = pdf.inner_document.get_dictionary(page_ids[1]).unwrap();
    assert_rectangle_eq(
        rectangle(second_page, b"MediaBox"),
        [0.0, 142.0, 500.0, 842.0],
    );
    assert!(second_page.get(b"BleedBox").is_err());
    assert!(second_page.get(b"TrimBox").is_err());
}

#[test]
fn page_removal_fixes_the_page_tree_count() {
    let bytes = common::build_rendered_document(&["q Q", "q Q", ""]);
    let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();
    let geometry = vec![PageGeometry::default(); 2];
    apply_page_geometry(&mut pdf, &geometry).unwrap();

    let document = &pdf.inner_document;
    let pages = common::follow(document, document.catalog().unwrap(), b"Pages");
    assert_eq!(pages.get(b"Count").unwrap().as_i64().unwrap(), 2);
    assert_eq!(pages.get(b"Kids").unwrap().as_array().unwrap().len(), 2);
}

#[test]
fn unexplained_length_mismatch_changes_nothing() {
    let bytes = common::build_rendered_document(&["q Q", "q Q", "q Q", "q Q"]);
    let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();
    let geometry = vec![
        PageGeometry {
            media_width: 500.0,
            media_height: 700.0,
            bleed_offset: 0.0,
            bleed_size: 0.0,
        };
        2
    ];
    apply_page_geometry(&mut pdf, &geometry).unwrap();

    let page_ids = pdf.page_ids();
    assert_eq!(page_ids.len(), 4);
    for page_id in page_ids {
        // The pages inherit their media box, none was written locally
        let page = pdf.inner_document.get_dictionary(page_id).unwrap();
        assert!(page.get(b"MediaBox").is_err());
    }
}

#[test]
fn pages_with_missing_or_degenerate_geometry_are_skipped() {
    let bytes = common::build_rendered_document(&["q Q", "q Q"]);
    let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();
    let geometry = vec![
        // Missing media size, as deserialized from an empty JSON object
        PageGeometry::default(),
        PageGeometry {
            media_width: 595.0,
            media_height: 842.0,
            bleed_offset: f64::NAN,
            bleed_size: 0.0,
        },
    ];
    apply_page_geometry(&mut pdf, &geometry).unwrap();

    for page_id in pdf.page_ids() {
        let page = pdf.inner_document.get_dictionary(page_id).unwrap();
        assert!(page.get(b"MediaBox").is_err());
    }
}
