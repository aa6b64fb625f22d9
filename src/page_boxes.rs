use serde::{Deserialize, Serialize};

use crate::error::ContextError;
use crate::pdf::PdfDocument;

/// The print geometry reported by the renderer for one page, in the length
/// units of the output document. Fields the renderer could not produce
/// deserialize to zero and make the page-box pass skip the page.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageGeometry {
    pub media_width: f64,
    pub media_height: f64,
    pub bleed_offset: f64,
    pub bleed_size: f64,
}

/// Reconciles the reported page geometry against the actual pages of the
/// document and writes the `MediaBox`/`BleedBox`/`TrimBox` of each page.
///
/// The renderer is known to append one spurious blank page, so a geometry
/// array exactly one entry short removes the last page first. Any other
/// length mismatch means the caller could not reliably produce the geometry,
/// and the pass leaves every page untouched instead of guessing.
pub fn apply_page_geometry(
    pdf: &mut PdfDocument,
    geometry: &[PageGeometry],
) -> Result<(), ContextError> {
    let mut page_ids = pdf.page_ids();

    if geometry.len() + 1 == page_ids.len() {
        pdf.remove_last_page()?;
        page_ids.pop();
    }
    if page_ids.len() != geometry.len() {
        log::warn!(
            "The page geometry covers {} pages but the document has {}, leaving the page boxes untouched",
            geometry.len(),
            page_ids.len()
        );
        return Ok(());
    }

    for (page_id, page_geometry) in page_ids.into_iter().zip(geometry) {
        if page_geometry.media_width <= 0.0 || page_geometry.media_height <= 0.0 {
            log::debug!(
                "Page {:?} reports no media size, leaving its boxes untouched",
                page_id
            );
            continue;
        }
        if !page_geometry.bleed_offset.is_finite() || !page_geometry.bleed_size.is_finite() {
            log::debug!(
                "Page {:?} reports a non-finite bleed, leaving its boxes untouched",
                page_id
            );
            continue;
        }

        // The media box is anchored to the top edge of the current page, so
        // a shorter media size moves the origin up rather than down
        let y_offset = pdf.page_height(page_id)? - page_geometry.media_height;
        pdf.set_page_box(
            page_id,
            "MediaBox",
            0.0,
            y_offset,
            page_geometry.media_width,
            page_geometry.media_height,
        )?;

        if page_geometry.bleed_offset == 0.0 && page_geometry.bleed_size == 0.0 {
            continue;
        }

        let bleed = page_geometry.bleed_offset;
        pdf.set_page_box(
            page_id,
            "BleedBox",
            bleed,
            y_offset + bleed,
            page_geometry.media_width - 2.0 * bleed,
            page_geometry.media_height - 2.0 * bleed,
        )?;

        let trim = page_geometry.bleed_offset + page_geometry.bleed_size;
        pdf.set_page_box(
            page_id,
            "TrimBox",
            trim,
            y_offset + trim,
            page_geometry.media_width - 2.0 * trim,
            page_geometry.media_height - 2.0 * trim,
        )?;
    }

    Ok(())
}
