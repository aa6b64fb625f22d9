//! Pressproof is the print-finishing stage of a publishing toolchain: it takes a freshly
//! rendered, unmodified PDF (produced elsewhere by driving a typesetting engine inside a
//! browser) and turns it into the final press-ready deliverable. The finishing consists of
//! four independent mutations of the document graph plus one optional external pass:
//! recoloring the RGB painting operators to a print-safe CMYK through a precomputed lookup
//! table, synthesizing the bookmark outline from the table of contents, stamping the
//! bibliographic metadata and the reading direction, correcting the media/bleed/trim boxes
//! of every page, and optionally handing the result to an external preflight tool for press
//! compliance (e.g. PDF/X-1a).
//!
//! The whole pipeline is driven through the `finish` function of the `document` module,
//! which takes the raw bytes and the renderer's finishing sidecar and returns the finished
//! bytes; `preflight::save` then writes them out, with or without the external pass. The
//! low-level PDF object storage is the `lopdf` crate, wrapped by the `PdfDocument` struct
//! of the `pdf` module so that the finishing passes only see the capability surface they
//! actually need.

/// The lexer for decoded content streams.
///
/// # Introduction
///
/// The entry point of this module is the `ContentTokenizer` struct, a single-pass scanner
/// that turns the text of one content stream into a lazy sequence of `Token`s: numeric
/// operands, operators, and opaque everything-else (strings, hex strings, names, comments,
/// delimiters and inline-image payloads). The classification is deliberately coarse because
/// the only consumer is the color rewriting pass, which needs to recognize number/operator
/// sequences and must treat every other construct as untouchable bytes.
///
/// The scanner is permissive: malformed input such as an unterminated string is carried
/// through as one opaque token instead of being rejected, since in print production a
/// degraded-but-valid output beats a crash. Numbers and operators embedded inside strings,
/// hex strings or inline-image binary are never tokenized as such, they are consumed inside
/// their enclosing token.
pub mod content_stream;

/// The pipeline entry point.
///
/// The `FinishingInstructions` struct is the JSON sidecar the renderer produces next to the
/// raw PDF bytes, and the `finish` function runs every finishing pass over the document in
/// one call.
pub mod document;

/// This module contains the `ContextError` type which is the error type used throughout this library.
///
/// The reason why this type has been implemented is to uniform the error reporting without delving to deep
/// into specific error codes which for such library would be too many and definitely out of scope.
///
/// The `ContextError` type is always returns from a `Result` type, which means that the end user can expect to obtain an explanation
/// whenever a function returns an error. If an error happened in a function which was called inside a function of this library,
/// then the user can expect to also obtain information about this propagated error.
///
/// Also, the `ContextError` type implements `std::fmt::Display` and `Debug`, so it can be explicitly printed out. It is also
/// a public type, which means that it can be reused in different libraries by implementing functions or external traits on top of it.
pub mod error;

/// The mapping of the renderer's metadata tree onto the document info dictionary, the
/// catalog language and the viewer preferences.
pub mod metadata;

/// The builder of the bookmark (outline) object graph from the table of contents.
///
/// The outline of a PDF is a linked structure of dictionaries wired through
/// `Parent`/`Prev`/`Next`/`First`/`Last` indirect references plus a per-node `Count` of all
/// descendants. The builder works in two passes so that every reference exists before any
/// dictionary pointing at it is written.
pub mod outline;

/// The reconciliation of the reported print geometry against the actual pages, and the
/// writing of the `MediaBox`/`BleedBox`/`TrimBox` rectangles.
pub mod page_boxes;

/// The module where the `PdfDocument` interface for working with PDF documents is presented.
///
/// # Introduction
///
/// The main component of this module is the struct `PdfDocument`, a thin capability wrapper
/// around `lopdf::Document`. The finishing passes direct it to enumerate pages, swap content
/// streams, allocate indirect references, write page boxes, info fields, viewer preferences
/// and catalog entries, and serialize the result back to bytes; they never parse or
/// serialize PDF structures themselves. The underlying `lopdf::Document` stays exposed as an
/// escape hatch for the end user, in the same spirit in which this library does not try to
/// hide the PDF specification from whoever needs it.
pub mod pdf;

/// The optional hand-off of the finished bytes to an external preflight tool, either as a
/// local command or inside a managed container.
pub mod preflight;

/// The rewriting of RGB painting operators to CMYK through the print-color lookup table.
///
/// Colors absent from the table are never approximated: they pass through untouched, with at
/// most one warning per unique rounded color per document run.
pub mod recolor;
