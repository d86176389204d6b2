#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Document decoders and page services for the table extraction engine.
//!
//! A [`DocumentSource`] hands out one [`PageLayout`] per page. Two decoders
//! are provided:
//!
//! - [`json::LayoutJsonSource`] reads a layout dump (fragments with
//!   bounding boxes, optional rule segments) produced by an external
//!   PDF/layout tool.
//! - [`pdf::PdfTextSource`] decodes a PDF with [`pdf_extract`] and lays its
//!   text lines out on a synthetic page. It has no real geometry and no
//!   rules, so only text-driven policies make sense on it.
//!
//! The page services the extractors need (region-clipped text and region
//! rasterization) live in [`text`] and [`render`].

pub mod json;
pub mod pdf;
pub mod render;
pub mod text;

use std::path::Path;

use serde_json::value::RawValue;
use tabcrop_layout_models::PageLayout;

pub use render::{PageRenderer, WireframeRenderer};
pub use text::extract_text;

/// Errors raised while decoding or rendering a document.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// Reading the source file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The layout document is not valid JSON or does not match the schema.
    #[error("Layout JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Pdf(String),

    /// A page index past the end of the document was requested.
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Requested zero-based page index.
        index: usize,
        /// Number of pages in the document.
        count: usize,
    },

    /// Rasterizing a region failed.
    #[error("Render error: {0}")]
    Render(String),
}

/// A decoded, paginated document.
///
/// Opening happens in each implementation's constructor; the document is
/// released when the value is dropped.
pub trait DocumentSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Decodes the page at `index` (zero-based).
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the index is out of range or the page
    /// cannot be decoded.
    fn page(&self, index: usize) -> Result<PageLayout, LayoutError>;

    /// Returns the page at `index` exactly as stored in the source, for
    /// unmodified passthrough copies.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the index is out of range or the page
    /// cannot be serialized.
    fn page_raw(&self, index: usize) -> Result<Box<RawValue>, LayoutError>;
}

/// Which decoder handles a given input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A PDF, decoded with [`pdf::PdfTextSource`].
    Pdf,
    /// A layout dump, decoded with [`json::LayoutJsonSource`].
    LayoutJson,
}

impl SourceKind {
    /// Picks the decoder from the file extension (`.pdf`, case-insensitive,
    /// selects the PDF decoder; anything else is treated as a layout dump).
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => Self::Pdf,
            _ => Self::LayoutJson,
        }
    }
}

/// Opens `path` with the decoder matching its extension.
///
/// # Errors
///
/// Returns [`LayoutError`] if the file cannot be read or decoded.
pub fn open(path: &Path) -> Result<Box<dyn DocumentSource>, LayoutError> {
    let source: Box<dyn DocumentSource> = match SourceKind::for_path(path) {
        SourceKind::Pdf => Box::new(pdf::PdfTextSource::open(path)?),
        SourceKind::LayoutJson => Box::new(json::LayoutJsonSource::open(path)?),
    };

    log::debug!("Opened {} ({} pages)", path.display(), source.page_count());

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_decoder_from_extension() {
        assert_eq!(SourceKind::for_path(Path::new("a/b.PDF")), SourceKind::Pdf);
        assert_eq!(SourceKind::for_path(Path::new("b.pdf")), SourceKind::Pdf);
        assert_eq!(
            SourceKind::for_path(Path::new("b.json")),
            SourceKind::LayoutJson
        );
        assert_eq!(
            SourceKind::for_path(Path::new("layout")),
            SourceKind::LayoutJson
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = open(Path::new("/definitely/not/here.json")).err();
        assert!(matches!(err, Some(LayoutError::Io(_))));
    }
}
