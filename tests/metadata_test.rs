mod common;

use lopdf::Object;
use pressproof::metadata::{apply_metadata, MetaTree, MetadataOptions, PageProgression};
use pressproof::pdf::PdfDocument;

fn sample_tree() -> MetaTree {
    serde_json::from_str(
        r#"{
            "dcterms:title": [{ "value": "The Finished Book", "order": 0 }],
            "dcterms:creator": [
                { "value": "Second Author", "order": 1 },
                { "value": "First Author", "order": 0 }
            ],
            "dcterms:description": [{ "value": "A worked example", "order": 0 }],
            "dcterms:subject": [
                { "value": "printing", "order": 0 },
                { "value": "typesetting", "order": 1 }
            ],
            "dcterms:created": [{ "value": "2023-05-04T12:30:00Z", "order": 0 }]
        }"#,
    )
    .unwrap()
}

fn loaded_pdf() -> PdfDocument {
    let bytes = common::build_rendered_document(&["q Q"]);
    PdfDocument::from_bytes(&bytes).unwrap()
}

fn info_dictionary(pdf: &PdfDocument) -> &lopdf::Dictionary {
    let info_id = pdf
        .inner_document
        .trailer
        .get(b"Info")
        .unwrap()
        .as_reference()
        .unwrap();
    pdf.inner_document.get_dictionary(info_id).unwrap()
}

#[test]
fn present_predicates_are_mapped_and_missing_ones_stay_unset() {
    let mut pdf = loaded_pdf();
    apply_metadata(&mut pdf, &sample_tree(), &MetadataOptions::default()).unwrap();

    let info = info_dictionary(&pdf);
    assert_eq!(common::string_entry(info, b"Title"), "The Finished Book");
    // Creators are joined in ordinal order, not in JSON order
    assert_eq!(
        common::string_entry(info, b"Author"),
        "First Author; Second Author"
    );
    assert_eq!(common::string_entry(info, b"Subject"), "A worked example");
    assert_eq!(
        common::string_entry(info, b"Keywords"),
        "printing typesetting"
    );
    assert_eq!(
        common::string_entry(info, b"CreationDate"),
        "D:20230504123000+00'00'"
    );

    // The tree carries no dcterms:language, so the catalog stays bare
    assert!(pdf.inner_document.catalog().unwrap().get(b"Lang").is_err());
}

#[test]
fn language_is_written_to_the_catalog() {
    let mut pdf = loaded_pdf();
    let tree: MetaTree = serde_json::from_str(
        r#"{ "dcterms:language": [{ "value": "ja", "order": 0 }] }"#,
    )
    .unwrap();
    apply_metadata(&mut pdf, &tree, &MetadataOptions::default()).unwrap();

    assert_eq!(
        pdf.inner_document.catalog().unwrap().get(b"Lang").unwrap(),
        &Object::String(b"ja".to_vec(), lopdf::StringFormat::Literal)
    );
}

#[test]
fn date_only_values_and_garbage_dates() {
    let mut pdf = loaded_pdf();
    let tree: MetaTree =
        serde_json::from_str(r#"{ "dcterms:date": [{ "value": "2023-05-04", "order": 0 }] }"#)
            .unwrap();
    apply_metadata(&mut pdf, &tree, &MetadataOptions::default()).unwrap();
    assert_eq!(
        common::string_entry(info_dictionary(&pdf), b"CreationDate"),
        "D:20230504000000+00'00'"
    );

    let mut pdf = loaded_pdf();
    let tree: MetaTree =
        serde_json::from_str(r#"{ "dcterms:date": [{ "value": "last Tuesday", "order": 0 }] }"#)
            .unwrap();
    apply_metadata(&mut pdf, &tree, &MetadataOptions::default()).unwrap();
    assert!(info_dictionary(&pdf).get(b"CreationDate").is_err());
}

#[test]
fn created_takes_precedence_over_date() {
    let mut pdf = loaded_pdf();
    let tree: MetaTree = serde_json::from_str(
        r#"{
            "dcterms:created": [{ "value": "2020-01-01", "order": 0 }],
            "dcterms:date": [{ "value": "2023-05-04", "order": 0 }]
        }"#,
    )
    .unwrap();
    apply_metadata(&mut pdf, &tree, &MetadataOptions::default()).unwrap();
    assert_eq!(
        common::string_entry(info_dictionary(&pdf), b"CreationDate"),
        "D:20200101000000+00'00'"
    );
}

#[test]
fn creator_string_is_synthesized_from_the_rendering_stack() {
    let mut pdf = loaded_pdf();
    let options = MetadataOptions {
        engine_version: Some("2.19.2".into()),
        browser_version: Some("Chromium 114.0".into()),
        ..Default::default()
    };
    apply_metadata(&mut pdf, &MetaTree::new(), &options).unwrap();
    assert_eq!(
        common::string_entry(info_dictionary(&pdf), b"Creator"),
        "pressproof 2.19.2 + Chromium 114.0"
    );

    let mut pdf = loaded_pdf();
    let options = MetadataOptions {
        engine_version: Some("2.19.2".into()),
        disable_creator: true,
        ..Default::default()
    };
    apply_metadata(&mut pdf, &MetaTree::new(), &options).unwrap();
    assert_eq!(
        common::string_entry(info_dictionary(&pdf), b"Creator"),
        "pressproof"
    );
}

#[test]
fn right_to_left_progression_sets_the_viewer_preference() {
    let mut pdf = loaded_pdf();
    let options = MetadataOptions {
        page_progression: PageProgression::Rtl,
        ..Default::default()
    };
    apply_metadata(&mut pdf, &MetaTree::new(), &options).unwrap();

    let catalog = pdf.inner_document.catalog().unwrap();
    let preferences = catalog
        .get(b"ViewerPreferences")
        .unwrap()
        .as_dict()
        .unwrap();
    assert_eq!(
        preferences.get(b"Direction").unwrap(),
        &Object::Name(b"R2L".to_vec())
    );

    // Left-to-right leaves the default alone
    let mut pdf = loaded_pdf();
    apply_metadata(&mut pdf, &MetaTree::new(), &MetadataOptions::default()).unwrap();
    assert!(pdf
        .inner_document
        .catalog()
        .unwrap()
        .get(b"ViewerPreferences")
        .is_err());
}
