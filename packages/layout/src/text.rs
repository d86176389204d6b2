//! Region-clipped text re-flow.
//!
//! Collects the line-level fragments whose vertical center falls inside a
//! rectangle, groups them into visual rows, and joins each row left to
//! right. Fragments separated by a wide horizontal gap are joined with two
//! spaces so column boundaries stay recognizable; everything else is joined
//! with a single space.

use tabcrop_layout_models::{BBox, Fragment, Granularity, PageLayout};

/// Horizontal gap (page units) at or above which two fragments on the same
/// row are treated as separate columns.
pub const COLUMN_GAP: f64 = 8.0;

/// Returns the text of `page` inside `rect`, one output line per visual
/// row, top to bottom.
#[must_use]
pub fn extract_text(page: &PageLayout, rect: &BBox) -> String {
    let fragments = page.fragments(Granularity::Line);

    let mut inside: Vec<&Fragment> = fragments
        .iter()
        .filter(|f| !f.is_blank())
        .filter(|f| {
            let center = f.bbox.vertical_center();
            center >= rect.top
                && center <= rect.bottom
                && f.bbox.right > rect.left
                && f.bbox.left < rect.right
        })
        .collect();

    inside.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.left.total_cmp(&b.bbox.left))
    });

    let mut rows: Vec<Vec<&Fragment>> = Vec::new();
    for fragment in inside {
        let center = fragment.bbox.vertical_center();
        match rows.last_mut() {
            Some(row) if center >= row[0].bbox.top && center <= row[0].bbox.bottom => {
                row.push(fragment);
            }
            _ => rows.push(vec![fragment]),
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left));
            join_row(&row)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_row(row: &[&Fragment]) -> String {
    let mut line = String::new();
    let mut previous: Option<&Fragment> = None;

    for fragment in row {
        if let Some(prev) = previous {
            let gap = fragment.bbox.left - prev.bbox.right;
            line.push_str(if gap >= COLUMN_GAP { "  " } else { " " });
        }
        line.push_str(fragment.trimmed());
        previous = Some(fragment);
    }

    line
}
