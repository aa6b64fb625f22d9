use std::collections::BTreeMap;

use lopdf::{Object, StringFormat};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization as _;

use crate::error::ContextError;
use crate::pdf::PdfDocument;

/// The namespaced metadata tree supplied by the renderer: a mapping from a
/// predicate URI such as `dcterms:title` to its ordered values.
pub type MetaTree = BTreeMap<String, Vec<MetaValue>>;

/// One value of a metadata predicate. Values are consulted in ascending
/// `order`; the optional `role` sub-map refines a value (for example the role
/// of a contributor) and is carried through untouched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaValue {
    pub value: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MetaTree>,
}

/// The reading order of the publication, as declared by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageProgression {
    #[default]
    Ltr,
    Rtl,
}

/// The knobs of the metadata pass that do not come from the metadata tree
/// itself: the reading direction and the ingredients of the creator string.
#[derive(Debug, Clone, Default)]
pub struct MetadataOptions {
    pub page_progression: PageProgression,
    pub engine_version: Option<String>,
    pub browser_version: Option<String>,
    /// When set, the creator field carries the bare tool name instead of the
    /// synthesized version string.
    pub disable_creator: bool,
}

/// Writes the bibliographic metadata of the tree into the document info
/// dictionary, the document language into the catalog, and the reading
/// direction into the viewer preferences. Missing predicates leave the
/// corresponding fields unset.
pub fn apply_metadata(
    pdf: &mut PdfDocument,
    metadata: &MetaTree,
    options: &MetadataOptions,
) -> Result<(), ContextError> {
    if let Some(title) = first_value(metadata, "dcterms:title") {
        pdf.set_info_entry("Title", text_string(title))?;
    }

    let creators = ordered_values(metadata, "dcterms:creator");
    if !creators.is_empty() {
        pdf.set_info_entry("Author", text_string(&creators.join("; ")))?;
    }

    if let Some(description) = first_value(metadata, "dcterms:description") {
        pdf.set_info_entry("Subject", text_string(description))?;
    }

    let subjects = ordered_values(metadata, "dcterms:subject");
    if !subjects.is_empty() {
        pdf.set_info_entry("Keywords", text_string(&subjects.join(" ")))?;
    }

    if let Some(language) = first_value(metadata, "dcterms:language") {
        // The viewer-visible document language lives on the catalog, there
        // is no standard info key for it
        pdf.set_catalog_entry("Lang", text_string(language))?;
    }

    let date_value =
        first_value(metadata, "dcterms:created").or(first_value(metadata, "dcterms:date"));
    if let Some(date_value) = date_value {
        match parse_date(date_value) {
            Some(date) => {
                pdf.set_info_entry(
                    "CreationDate",
                    Object::String(to_pdf_timestamp_format(&date).into_bytes(), StringFormat::Literal),
                )?;
            }
            None => {
                log::warn!(
                    "Unable to parse the creation date {:?}, leaving it unset",
                    date_value
                );
            }
        }
    }

    pdf.set_info_entry("Creator", text_string(&creator_string(options)))?;

    if options.page_progression == PageProgression::Rtl {
        pdf.set_reading_direction_right_to_left()?;
    }

    Ok(())
}

/// The value of the given predicate at ordinal position zero, if any.
fn first_value<'a>(metadata: &'a MetaTree, predicate: &str) -> Option<&'a str> {
    let values = metadata.get(predicate)?;
    values
        .iter()
        .min_by_key(|value| value.order)
        .map(|value| value.value.as_str())
}

/// All values of the given predicate, in ascending ordinal position.
fn ordered_values<'a>(metadata: &'a MetaTree, predicate: &str) -> Vec<&'a str> {
    let Some(values) = metadata.get(predicate) else {
        return Vec::new();
    };
    let mut sorted: Vec<&MetaValue> = values.iter().collect();
    sorted.sort_by_key(|value| value.order);
    sorted.into_iter().map(|value| value.value.as_str()).collect()
}

/// Synthesizes the creator string from the tool name and the versions of the
/// rendering engine and of the browser it was driven in.
fn creator_string(options: &MetadataOptions) -> String {
    if options.disable_creator {
        return "pressproof".into();
    }
    let mut creator = String::from("pressproof");
    if let Some(engine_version) = &options.engine_version {
        creator.push(' ');
        creator.push_str(engine_version);
    }
    if let Some(browser_version) = &options.browser_version {
        creator.push_str(" + ");
        creator.push_str(browser_version);
    }

    creator
}

/// Parses a metadata date, accepting a full RFC 3339 timestamp or a plain
/// `year-month-day` date taken as midnight UTC.
fn parse_date(value: &str) -> Option<OffsetDateTime> {
    if let Ok(date) = OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339) {
        return Some(date);
    }
    let date_only = time::macros::format_description!("[year]-[month]-[day]");
    time::Date::parse(value, &date_only)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

/// A text string object in the NFC form the rest of the library writes.
fn text_string(value: &str) -> Object {
    Object::String(
        value.nfc().collect::<String>().into_bytes(),
        StringFormat::Literal,
    )
}
