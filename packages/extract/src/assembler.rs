//! Cross-page output assembly.
//!
//! The assembler is the only state shared between pages. Results are pushed
//! in page order and [`Assembler::finish`] builds the artifact for the
//! configured output mode.

use tabcrop_extract_models::{
    Artifact, ExtractionResult, Outcome, OutputContent, OutputMode, OutputPage, RunReport,
    RunSummary, SkipReason, StructuredTable,
};

/// Caption for an output page, e.g. `Page 3 - TRANSACTIONS Table`.
#[must_use]
pub fn caption(page_number: usize, label: &str) -> String {
    format!("Page {page_number} - {label} Table")
}

/// Accumulates per-page results for one run.
#[derive(Debug)]
pub struct Assembler {
    mode: OutputMode,
    label: String,
    pages_scanned: usize,
    pages: Vec<OutputPage>,
    tables: Vec<StructuredTable>,
    selection: Vec<usize>,
}

impl Assembler {
    #[must_use]
    pub fn new(mode: OutputMode, label: impl Into<String>) -> Self {
        Self {
            mode,
            label: label.into(),
            pages_scanned: 0,
            pages: Vec::new(),
            tables: Vec::new(),
            selection: Vec::new(),
        }
    }

    /// Records a page that produced nothing.
    pub fn record_skip(&mut self, page_index: usize, reason: SkipReason) {
        self.pages_scanned += 1;
        log::debug!("Page {}: skipped ({reason})", page_index + 1);
    }

    /// Records a page's result. Pages must be pushed in ascending order.
    pub fn push(&mut self, page_index: usize, result: ExtractionResult) {
        self.pages_scanned += 1;
        let page_number = page_index + 1;

        match result {
            ExtractionResult::Raster(image) => self.pages.push(OutputPage {
                page_number,
                caption: caption(page_number, &self.label),
                content: OutputContent::Image(image),
            }),
            ExtractionResult::PlainText(lines) => self.pages.push(OutputPage {
                page_number,
                caption: caption(page_number, &self.label),
                content: OutputContent::Text(lines),
            }),
            ExtractionResult::Structured(table) => self.tables.push(table),
            ExtractionResult::Passthrough { page_index } => self.selection.push(page_index),
        }
    }

    /// Number of pages that produced a result so far.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.pages.len() + self.tables.len() + self.selection.len()
    }

    /// Builds the run report. No matches yield [`Outcome::NoMatch`] and no
    /// artifact.
    #[must_use]
    pub fn finish(self) -> RunReport {
        let pages_matched = self.matched();

        let artifact = match self.mode {
            _ if pages_matched == 0 => None,
            OutputMode::Image | OutputMode::Text => Some(Artifact::Document(self.pages)),
            OutputMode::Structured => {
                let mut tables = self.tables;
                if tables.len() == 1 {
                    tables.pop().map(Artifact::Table)
                } else {
                    Some(Artifact::Tables(tables))
                }
            }
            OutputMode::Passthrough => Some(Artifact::PageSelection(self.selection)),
        };

        let outcome = if artifact.is_some() {
            Outcome::Matched
        } else {
            Outcome::NoMatch
        };

        RunReport {
            summary: RunSummary {
                pages_scanned: self.pages_scanned,
                pages_matched,
                outcome,
            },
            artifact,
        }
    }
}
