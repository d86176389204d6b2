//! Per-page progress events for [`Extractor::run`](crate::Extractor::run).

use std::sync::Arc;

use tabcrop_extract_models::RunSummary;

/// Observes a run page by page.
pub trait ProgressCallback: Send + Sync {
    /// Called once before the first page with the document's page count.
    fn begin(&self, page_count: usize);

    /// Called after each page. `matched` counts matching pages so far,
    /// this one included.
    fn page_done(&self, page_index: usize, matched: usize);

    /// Called once after the last page.
    fn finish(&self, summary: &RunSummary);
}

pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn begin(&self, _page_count: usize) {}
    fn page_done(&self, _page_index: usize, _matched: usize) {}
    fn finish(&self, _summary: &RunSummary) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
