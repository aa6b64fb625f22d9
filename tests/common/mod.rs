use lopdf::{dictionary, Object, Stream};

/// Builds a minimal rendered document in memory, one page per content
/// stream, with the page size inherited from the page tree root. The
/// returned bytes stand in for the output of the upstream renderer.
pub fn build_rendered_document(page_contents: &[&str]) -> Vec<u8> {
    let mut document = lopdf::Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let mut kids = Vec::new();
    for content in page_contents {
        let content_id = document.add_object(Stream::new(
            dictionary! {},
            content.as_bytes().to_vec(),
        ));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    document.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    document.save_to(&mut bytes).unwrap();
    bytes
}

/// Follows a reference entry of a dictionary to the dictionary it points at.
pub fn follow<'a>(
    document: &'a lopdf::Document,
    dictionary: &lopdf::Dictionary,
    key: &[u8],
) -> &'a lopdf::Dictionary {
    let reference = dictionary.get(key).unwrap().as_reference().unwrap();
    document.get_dictionary(reference).unwrap()
}

/// Reads a text string entry of a dictionary.
pub fn string_entry(dictionary: &lopdf::Dictionary, key: &[u8]) -> String {
    match dictionary.get(key).unwrap() {
        Object::String(bytes, _) => String::from_utf8(bytes.clone()).unwrap(),
        other => panic!("expected a string at {:?}, found {:?}", key, other),
    }
}
