use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ContextError;
use crate::metadata::{apply_metadata, MetaTree, MetadataOptions, PageProgression};
use crate::outline::{attach_outline, TocEntry};
use crate::page_boxes::{apply_page_geometry, PageGeometry};
use crate::pdf::PdfDocument;
use crate::recolor::{rewrite_stream, ColorTable};

/// The finishing sidecar the renderer produces next to the raw PDF bytes:
/// the table of contents, the metadata tree, the per-page print geometry,
/// the reading order, and the version strings of the rendering stack.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinishingInstructions {
    pub toc: Vec<TocEntry>,
    pub metadata: MetaTree,
    pub page_geometry: Vec<PageGeometry>,
    pub page_progression: PageProgression,
    pub engine_version: Option<String>,
    pub browser_version: Option<String>,
}

impl FinishingInstructions {
    /// Loads the finishing sidecar from a JSON file.
    pub fn from_path(instructions_path: &PathBuf) -> Result<FinishingInstructions, ContextError> {
        let instructions_content =
            std::fs::read_to_string(instructions_path).map_err(|error| {
                ContextError::with_error(
                    format!("Unable to read the instructions {:?}", instructions_path),
                    &error,
                )
            })?;
        let instructions: FinishingInstructions = serde_json::from_str(&instructions_content)
            .map_err(|error| {
                ContextError::with_error(
                    format!("Unable to parse the instructions {:?}", instructions_path),
                    &error,
                )
            })?;

        Ok(instructions)
    }
}

/// The caller-side knobs of a finishing run that are not part of the
/// renderer's sidecar: the print-color table and the warning and creator
/// switches.
#[derive(Debug, Default)]
pub struct FinishOptions {
    pub color_table: ColorTable,
    pub warn_on_unmapped: bool,
    pub disable_creator_metadata: bool,
}

/// Runs the whole finishing pipeline over a freshly rendered PDF and returns
/// the finished bytes.
///
/// The bytes are loaded into the document graph once, every page's content
/// stream is rewritten through the color table with one shared warned set,
/// and then the outline, the metadata and the page boxes are applied. The
/// three graph passes touch disjoint parts of the document and could run in
/// any order; the sequence here is just the reading order of the code.
pub fn finish(
    pdf_bytes: &[u8],
    instructions: &FinishingInstructions,
    options: &FinishOptions,
) -> Result<Vec<u8>, ContextError> {
    let mut pdf = PdfDocument::from_bytes(pdf_bytes)?;

    let mut warned_colors = HashSet::new();
    for page_id in pdf.page_ids() {
        let content = pdf.page_content(page_id)?;
        let rewritten = rewrite_stream(
            &content,
            &options.color_table,
            options.warn_on_unmapped,
            &mut warned_colors,
        );
        pdf.set_page_content(page_id, rewritten)?;
    }

    attach_outline(&mut pdf, &instructions.toc)?;
    apply_metadata(
        &mut pdf,
        &instructions.metadata,
        &MetadataOptions {
            page_progression: instructions.page_progression,
            engine_version: instructions.engine_version.clone(),
            browser_version: instructions.browser_version.clone(),
            disable_creator: options.disable_creator_metadata,
        },
    )?;
    apply_page_geometry(&mut pdf, &instructions.page_geometry)?;

    pdf.save_to_bytes()
}
