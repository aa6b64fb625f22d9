use lopdf::{Object, StringFormat};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization as _;

use crate::error::ContextError;
use crate::pdf::PdfDocument;

/// One entry of the externally supplied table of contents. The `id` must be
/// a named-destination key already registered elsewhere in the document; the
/// entries form an ordered forest.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub children: Vec<TocEntry>,
}

/// A table-of-contents entry with the indirect references assigned to it and
/// to its parent. Built once per outline build, never shared.
struct OutlineNode<'a> {
    entry: &'a TocEntry,
    object_id: lopdf::ObjectId,
    parent_id: lopdf::ObjectId,
    children: Vec<OutlineNode<'a>>,
}

/// Builds the bookmark (outline) object graph for the given table of
/// contents and hooks it into the document catalog. An empty forest leaves
/// the document untouched.
///
/// The build runs in two passes: a top-down pass allocating one fresh
/// indirect reference per entry, then a construction pass that writes the
/// linked `Parent`/`Prev`/`Next`/`First`/`Last`/`Count` dictionaries in
/// sibling order.
pub fn attach_outline(pdf: &mut PdfDocument, entries: &[TocEntry]) -> Result<(), ContextError> {
    if entries.is_empty() {
        return Ok(());
    }

    // First pass: every node gets its own reference and its parent's, with
    // the synthetic outline root as the parent of the top level
    let root_id = pdf.allocate_object_id();
    let nodes = assign_references(pdf, entries, root_id);

    // Second pass: write the linked dictionaries
    write_sibling_list(pdf, &nodes);

    let root_dictionary = lopdf::Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Outlines".to_vec())),
        ("First", Object::Reference(nodes[0].object_id)),
        ("Last", Object::Reference(nodes[nodes.len() - 1].object_id)),
        ("Count", Object::Integer(count_all(entries))),
    ]);
    pdf.set_object(root_id, Object::Dictionary(root_dictionary));
    pdf.set_catalog_entry("Outlines", Object::Reference(root_id))?;

    log::debug!(
        "Attached an outline of {} bookmarks to the document catalog",
        count_all(entries)
    );
    Ok(())
}

/// Allocates one indirect reference per entry of the forest, depth first,
/// recording each node's parent reference along the way.
fn assign_references<'a>(
    pdf: &mut PdfDocument,
    entries: &'a [TocEntry],
    parent_id: lopdf::ObjectId,
) -> Vec<OutlineNode<'a>> {
    let mut nodes = Vec::with_capacity(entries.len());
    for entry in entries {
        let object_id = pdf.allocate_object_id();
        let children = assign_references(pdf, &entry.children, object_id);
        nodes.push(OutlineNode {
            entry,
            object_id,
            parent_id,
            children,
        });
    }

    nodes
}

/// Writes the outline dictionary of every node of one sibling list, linking
/// the siblings through `Prev`/`Next` in input order, then recurses into the
/// children.
fn write_sibling_list(pdf: &mut PdfDocument, siblings: &[OutlineNode]) {
    for (index, node) in siblings.iter().enumerate() {
        let mut dictionary = lopdf::Dictionary::from_iter(vec![
            (
                "Title",
                Object::String(
                    node.entry.title.nfc().collect::<String>().into_bytes(),
                    StringFormat::Literal,
                ),
            ),
            ("Dest", Object::Name(node.entry.id.clone().into_bytes())),
            ("Parent", Object::Reference(node.parent_id)),
        ]);
        if index > 0 {
            dictionary.set("Prev", Object::Reference(siblings[index - 1].object_id));
        }
        if index + 1 < siblings.len() {
            dictionary.set("Next", Object::Reference(siblings[index + 1].object_id));
        }
        if !node.children.is_empty() {
            dictionary.set("First", Object::Reference(node.children[0].object_id));
            dictionary.set(
                "Last",
                Object::Reference(node.children[node.children.len() - 1].object_id),
            );
            dictionary.set("Count", Object::Integer(count_all(&node.entry.children)));
        }
        pdf.set_object(node.object_id, Object::Dictionary(dictionary));

        write_sibling_list(pdf, &node.children);
    }
}

/// Counts the entries of the forest at all depths, which is what the PDF
/// `Count` key of a fully expanded outline holds.
fn count_all(entries: &[TocEntry]) -> i64 {
    entries.len() as i64
        + entries
            .iter()
            .map(|entry| count_all(&entry.children))
            .sum::<i64>()
}
