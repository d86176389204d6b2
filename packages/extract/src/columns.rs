//! Whitespace column splitting for structured output.
//!
//! Columns in re-flowed region text are separated by runs of two or more
//! whitespace characters. The first non-blank line names the columns; a
//! later line becomes a row only when it splits into exactly as many cells.
//! Rows that do not line up are dropped, which loses data on tables with
//! empty cells but never shifts values into the wrong column.

use std::sync::LazyLock;

use regex::Regex;
use tabcrop_extract_models::{SkipReason, StructuredTable};

static COLUMN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Splits one line into cells.
#[must_use]
pub fn split_columns(line: &str) -> Vec<&str> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    COLUMN_SEPARATOR.split(line).collect()
}

/// Parses re-flowed region text into a header-keyed table.
///
/// # Errors
///
/// Returns [`SkipReason::NoColumnHeaders`] when the text is blank or its
/// header line has fewer than two columns.
pub fn parse_table(text: &str) -> Result<StructuredTable, SkipReason> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines.next().map(split_columns).unwrap_or_default();
    if header.len() < 2 {
        log::debug!("Header {header:?} has fewer than 2 columns");
        return Err(SkipReason::NoColumnHeaders);
    }

    let mut table = StructuredTable::new(&header);
    for line in lines {
        let cells = split_columns(line);
        if !table.push_row(&cells) {
            log::debug!(
                "Dropping row with {} cells (expected {}): {line:?}",
                cells.len(),
                header.len()
            );
        }
    }

    Ok(table)
}
