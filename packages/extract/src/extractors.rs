//! Per-page extractors. Each one turns a resolved region into an
//! [`ExtractionResult`] without touching any other page.

use tabcrop_extract_models::{ExtractionResult, SkipReason, TableRegion};
use tabcrop_layout::{extract_text, LayoutError, PageRenderer};
use tabcrop_layout_models::{BBox, PageLayout};

use crate::columns::parse_table;

/// Rasterizes the region across the full page width.
///
/// # Errors
///
/// Returns [`LayoutError`] if rendering fails.
pub fn image(
    page: &PageLayout,
    region: &TableRegion,
    renderer: &dyn PageRenderer,
    dpi: u32,
) -> Result<ExtractionResult, LayoutError> {
    let rect = BBox::new(0.0, region.bbox.top, page.width, region.bbox.bottom);
    renderer.render(page, &rect, dpi).map(ExtractionResult::Raster)
}

/// Re-flows the region's text into lines, dropping leading and trailing
/// blank lines.
#[must_use]
pub fn text_lines(page: &PageLayout, region: &TableRegion) -> Vec<String> {
    let text = extract_text(page, &region.bbox);
    let lines: Vec<&str> = text.lines().collect();

    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());

    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end]
            .iter()
            .map(|l| (*l).to_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Plain text output.
#[must_use]
pub fn text(page: &PageLayout, region: &TableRegion) -> ExtractionResult {
    ExtractionResult::PlainText(text_lines(page, region))
}

/// Column-split structured output.
///
/// # Errors
///
/// Returns [`SkipReason::NoColumnHeaders`] when the region's first line
/// does not name at least two columns.
pub fn structured(page: &PageLayout, region: &TableRegion) -> Result<ExtractionResult, SkipReason> {
    parse_table(&extract_text(page, &region.bbox)).map(ExtractionResult::Structured)
}

/// Marks the page for an unchanged copy.
#[must_use]
pub const fn passthrough(page_index: usize) -> ExtractionResult {
    ExtractionResult::Passthrough { page_index }
}
