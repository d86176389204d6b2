//! PDF decoder built on [`pdf_extract`].
//!
//! `pdf_extract` yields plain text per page without positions, so every
//! non-blank text line becomes one fragment on a synthetic US-letter page:
//! lines are stacked at a fixed pitch from the top margin and keep their
//! original order. Blank lines still advance the pitch, so vertical gaps in
//! the text survive as gaps between fragments.

use std::path::Path;

use serde_json::value::RawValue;
use tabcrop_layout_models::{BBox, Fragment, PageLayout};

use crate::{DocumentSource, LayoutError};

/// Synthetic page width (US letter, in points).
pub const PAGE_WIDTH: f64 = 612.0;
/// Synthetic page height (US letter, in points).
pub const PAGE_HEIGHT: f64 = 792.0;
/// Margin on every side of the synthetic page.
pub const MARGIN: f64 = 36.0;
/// Vertical distance between consecutive text lines.
pub const LINE_PITCH: f64 = 12.0;
/// Height of one line's fragment. The remainder of the pitch is leading,
/// so consecutive lines never touch.
pub const LINE_HEIGHT: f64 = 10.0;
/// Horizontal advance per character.
pub const CHAR_WIDTH: f64 = 6.0;

/// A [`DocumentSource`] backed by a PDF file.
#[derive(Debug)]
pub struct PdfTextSource {
    pages: Vec<PageLayout>,
}

impl PdfTextSource {
    /// Reads the PDF at `path` and extracts the text of every page.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Io`] if the file cannot be read, or
    /// [`LayoutError::Pdf`] if text extraction fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let bytes = std::fs::read(path.as_ref())?;

        log::debug!("Read {} bytes from {}", bytes.len(), path.as_ref().display());

        let texts = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
            LayoutError::Pdf(format!("failed to extract text from PDF: {e}"))
        })?;

        Ok(Self::from_page_texts(&texts))
    }

    /// Builds the synthetic pages from already extracted page texts.
    #[must_use]
    pub fn from_page_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        Self {
            pages: texts.iter().map(|t| layout_text(t.as_ref())).collect(),
        }
    }
}

impl DocumentSource for PdfTextSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<PageLayout, LayoutError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or(LayoutError::PageOutOfRange {
                index,
                count: self.pages.len(),
            })
    }

    fn page_raw(&self, index: usize) -> Result<Box<RawValue>, LayoutError> {
        let page = self.page(index)?;
        Ok(serde_json::value::to_raw_value(&page)?)
    }
}

/// Stacks the lines of `text` on a synthetic page.
///
/// Lines that run past the bottom margin are still emitted; the page grows
/// to hold them so no text is lost.
fn layout_text(text: &str) -> PageLayout {
    let mut blocks = Vec::new();
    let mut top = MARGIN;

    for line in text.lines() {
        let trimmed_end = line.trim_end();
        if !trimmed_end.trim_start().is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let chars = trimmed_end.chars().count() as f64;
            let right = CHAR_WIDTH.mul_add(chars, MARGIN).min(PAGE_WIDTH - MARGIN);
            blocks.push(Fragment::new(
                BBox::new(MARGIN, top, right.max(MARGIN + CHAR_WIDTH), top + LINE_HEIGHT),
                trimmed_end,
            ));
        }
        top += LINE_PITCH;
    }

    let mut page = PageLayout::new(PAGE_WIDTH, PAGE_HEIGHT.max(top + MARGIN));
    page.lines.clone_from(&blocks);
    page.blocks = blocks;
    page
}
