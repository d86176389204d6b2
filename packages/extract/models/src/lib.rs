#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Extraction job configuration and result types.
//!
//! [`ExtractionConfig`] is the single, serializable description of an
//! extraction job: how to find the anchor, which termination policy ends
//! the table, how to pad the region and which output form to produce.
//! Every field has a default so a job file only lists what it changes.
//!
//! The result side ([`AnchorMatch`], [`TableRegion`], [`ExtractionResult`],
//! [`Artifact`], [`RunSummary`]) is produced by `tabcrop_extract`.

use serde::ser::SerializeMap as _;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};
use tabcrop_layout_models::{BBox, ColorClass, Fragment, Granularity, RasterImage};

// ── Job configuration ────────────────────────────────────────────────────

/// How the anchor fragment's text is matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorPattern {
    /// Trimmed text equals `value` exactly.
    Exact {
        /// Text to match.
        value: String,
    },
    /// Trimmed text contains `value`, ignoring case.
    Contains {
        /// Substring to look for.
        value: String,
    },
    /// Trimmed text contains any of `values`, ignoring case.
    AnyOf {
        /// Substrings to look for.
        values: Vec<String>,
    },
    /// Trimmed text matches the regular expression `value`.
    Regex {
        /// Pattern in `regex` crate syntax.
        value: String,
    },
}

impl AnchorPattern {
    /// Human-readable label used in output captions (e.g. `TRANSACTIONS`).
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Exact { value } | Self::Contains { value } | Self::Regex { value } => {
                value.clone()
            }
            Self::AnyOf { values } => values.join(" / "),
        }
    }
}

/// A colored ruling line that must sit next to the anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRequirement {
    /// Stroke color class the rule must have.
    pub color_class: ColorClass,
    /// Vertical slack in page units.
    #[serde(default = "default_rule_tolerance")]
    pub tolerance: f64,
}

const fn default_rule_tolerance() -> f64 {
    2.0
}

/// Decides where the table body ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// Stop at the first fully upper-case fragment (a new section
    /// heading) that does not start with `continuation_prefix`.
    HeadingBreak {
        /// Prefix that marks upper-case data rows (e.g. `TRN_`).
        #[serde(default)]
        continuation_prefix: Option<String>,
    },
    /// Stop at the first fragment whose upper-cased text contains any of
    /// `keywords`.
    KeywordTerminator {
        /// Terminator vocabulary (e.g. `PRIMARY KEY`, `CONSTRAINT`).
        keywords: Vec<String>,
        /// Only fully upper-case fragments may terminate.
        #[serde(default)]
        require_upper_case: bool,
    },
    /// Collect the first contiguous run of row-shaped fragments.
    RowShape {
        /// Tokens of which a row must contain at least one (substring,
        /// case-insensitive).
        vocabulary: Vec<String>,
        /// Minimum whitespace-separated token count for a row.
        #[serde(default = "default_min_tokens")]
        min_tokens: usize,
    },
}

const fn default_min_tokens() -> usize {
    3
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::HeadingBreak {
            continuation_prefix: None,
        }
    }
}

impl TerminationPolicy {
    /// Short name for log messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HeadingBreak { .. } => "heading_break",
            Self::KeywordTerminator { .. } => "keyword_terminator",
            Self::RowShape { .. } => "row_shape",
        }
    }
}

/// Horizontal extent of a resolved region.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HorizontalBounds {
    /// Span the whole page width.
    #[default]
    FullWidth,
    /// Span the union of the body fragments' boxes.
    FragmentUnion,
}

/// Output representation produced for every matching page.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputMode {
    /// Rasterize the region.
    Image,
    /// Re-flow the region's text into lines.
    Text,
    /// Column-split the region's text into a header-keyed table.
    #[default]
    Structured,
    /// Copy the matching page unchanged.
    Passthrough,
}

/// Vertical padding applied around the body fragments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    /// Added above the topmost fragment (negative trims).
    pub above: f64,
    /// Added below the bottommost fragment (negative trims).
    pub below: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            above: ExtractionConfig::DEFAULT_PADDING,
            below: ExtractionConfig::DEFAULT_PADDING,
        }
    }
}

/// A complete extraction job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Anchor matcher. May only be omitted with the row-shape policy, in
    /// which case the whole page is scanned.
    pub anchor_pattern: Option<AnchorPattern>,
    /// Caption label; derived from the pattern when unset.
    pub anchor_label: Option<String>,
    /// Fragment granularity the anchor is searched at.
    pub anchor_granularity: Granularity,
    /// The anchor's bottom edge must lie above this fraction of the page
    /// height.
    pub anchor_zone_fraction: f64,
    /// Require the anchor to start right of `right_aligned_fraction`.
    pub require_right_aligned: bool,
    /// Minimum left-edge position, as a fraction of the page width.
    pub right_aligned_fraction: f64,
    /// A rule of the given color must run above the anchor.
    pub require_line_above: Option<RuleRequirement>,
    /// A rule of the given color must run below the anchor.
    pub require_line_below: Option<RuleRequirement>,
    /// Where the table ends.
    pub termination_policy: TerminationPolicy,
    /// Phrases that must all appear (case-insensitive) in one fragment
    /// before body collection starts.
    pub start_after: Vec<String>,
    pub padding_above: f64,
    pub padding_below: f64,
    /// Horizontal bounds for text and structured output. Image output
    /// always spans the full page width.
    pub horizontal_bounds: HorizontalBounds,
    /// Clamp the region bottom to this fraction of the page height.
    pub footer_exclusion_fraction: Option<f64>,
    pub output_mode: OutputMode,
    /// Resolution for image output.
    pub raster_dpi: u32,
}

impl ExtractionConfig {
    pub const DEFAULT_ZONE_FRACTION: f64 = 0.15;
    pub const DEFAULT_RIGHT_ALIGNED_FRACTION: f64 = 0.6;
    pub const DEFAULT_PADDING: f64 = 5.0;
    pub const DEFAULT_DPI: u32 = 300;

    /// The padding pair.
    #[must_use]
    pub const fn padding(&self) -> Padding {
        Padding {
            above: self.padding_above,
            below: self.padding_below,
        }
    }

    /// Label used in output captions.
    #[must_use]
    pub fn label(&self) -> String {
        self.anchor_label
            .clone()
            .or_else(|| self.anchor_pattern.as_ref().map(AnchorPattern::label))
            .unwrap_or_else(|| "Detected".to_owned())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            anchor_pattern: None,
            anchor_label: None,
            anchor_granularity: Granularity::Block,
            anchor_zone_fraction: Self::DEFAULT_ZONE_FRACTION,
            require_right_aligned: false,
            right_aligned_fraction: Self::DEFAULT_RIGHT_ALIGNED_FRACTION,
            require_line_above: None,
            require_line_below: None,
            termination_policy: TerminationPolicy::default(),
            start_after: Vec::new(),
            padding_above: Self::DEFAULT_PADDING,
            padding_below: Self::DEFAULT_PADDING,
            horizontal_bounds: HorizontalBounds::FullWidth,
            footer_exclusion_fraction: None,
            output_mode: OutputMode::Structured,
            raster_dpi: Self::DEFAULT_DPI,
        }
    }
}

// ── Per-page results ─────────────────────────────────────────────────────

/// The located header fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorMatch {
    pub fragment: Fragment,
    /// Lower bound for body scanning.
    pub header_bottom: f64,
}

/// A resolved table rectangle and the fragments inside it.
///
/// `bbox.top < bbox.bottom`, and every fragment's vertical span lies
/// within `[bbox.top, bbox.bottom]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRegion {
    pub bbox: BBox,
    pub fragments: Vec<Fragment>,
}

/// Why a page produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// No fragment matched the anchor pattern and constraints.
    NoAnchor,
    /// No fragment qualified as table body.
    EmptyBody,
    /// Padding or footer exclusion left no area.
    EmptyRegion,
    /// The first text line split into fewer than two column headers.
    NoColumnHeaders,
}

/// A header-keyed table: ordered columns, one value list per column.
///
/// Every column holds the same number of values. Serializes as a JSON
/// object whose keys follow column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredTable {
    columns: Vec<String>,
    values: Vec<Vec<String>>,
}

impl StructuredTable {
    /// Creates an empty table. Repeated header names get a numeric suffix
    /// (`AMOUNT`, `AMOUNT_2`, …) so every column stays addressable.
    #[must_use]
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut columns: Vec<String> = Vec::with_capacity(headers.len());
        for header in headers {
            let base = header.as_ref();
            let mut name = base.to_owned();
            let mut n = 2;
            while columns.contains(&name) {
                name = format!("{base}_{n}");
                n += 1;
            }
            columns.push(name);
        }
        let values = vec![Vec::new(); columns.len()];
        Self { columns, values }
    }

    /// Appends a row when it has exactly one cell per column. Returns
    /// `false` (and leaves the table untouched) otherwise.
    pub fn push_row<S: AsRef<str>>(&mut self, cells: &[S]) -> bool {
        if cells.len() != self.columns.len() {
            return false;
        }
        for (column, cell) in self.values.iter_mut().zip(cells) {
            column.push(cell.as_ref().to_owned());
        }
        true
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values of the column named `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].as_slice())
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }
}

impl Serialize for StructuredTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, values) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// What one matching page produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Raster(RasterImage),
    Structured(StructuredTable),
    PlainText(Vec<String>),
    /// Copy of the page at this zero-based index.
    Passthrough { page_index: usize },
}

// ── Run output ───────────────────────────────────────────────────────────

/// Content of one page in an output document.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputContent {
    Image(RasterImage),
    Text(Vec<String>),
}

/// One page of an output document, built from one matching input page.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPage {
    /// One-based number of the source page.
    pub page_number: usize,
    /// Caption, e.g. `Page 3 - TRANSACTIONS Table`.
    pub caption: String,
    pub content: OutputContent,
}

/// The finished artifact of a run with at least one match.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Image or text pages, in source page order.
    Document(Vec<OutputPage>),
    /// Exactly one table was found.
    Table(StructuredTable),
    /// Two or more tables, in source page order.
    Tables(Vec<StructuredTable>),
    /// Zero-based indices of pages to copy unchanged, in order.
    PageSelection(Vec<usize>),
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Matched,
    NoMatch,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pages_scanned: usize,
    pub pages_matched: usize,
    pub outcome: Outcome,
}

/// Everything a run produced. `artifact` is `None` exactly when the
/// outcome is [`Outcome::NoMatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub summary: RunSummary,
    pub artifact: Option<Artifact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_serializes_in_column_order() {
        let mut table = StructuredTable::new(&["DATE", "AMOUNT", "DESC"]);
        assert!(table.push_row(&["2024-01-01", "100.00", "Coffee"]));
        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"{"DATE":["2024-01-01"],"AMOUNT":["100.00"],"DESC":["Coffee"]}"#
        );
    }

    #[test]
    fn rejects_rows_of_the_wrong_width() {
        let mut table = StructuredTable::new(&["DATE", "AMOUNT", "DESC"]);
        assert!(!table.push_row(&["2024-01-01", "100.00"]));
        assert_eq!(table.row_count(), 0);
        assert!(table.columns().iter().all(|c| table.column(c) == Some(&[][..])));
    }

    #[test]
    fn duplicate_headers_are_suffixed() {
        let mut table = StructuredTable::new(&["AMOUNT", "AMOUNT", "AMOUNT"]);
        assert_eq!(table.columns(), ["AMOUNT", "AMOUNT_2", "AMOUNT_3"]);
        assert!(table.push_row(&["1", "2", "3"]));
        assert_eq!(table.column("AMOUNT_2"), Some(&["2".to_owned()][..]));
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: ExtractionConfig = toml::from_str(
            r#"
            output_mode = "image"

            [anchor_pattern]
            kind = "exact"
            value = "TRANSACTIONS"

            [termination_policy]
            kind = "keyword_terminator"
            keywords = ["PRIMARY KEY", "CONSTRAINT"]
            "#,
        )
        .unwrap();

        assert_eq!(config.output_mode, OutputMode::Image);
        assert_eq!(config.raster_dpi, 300);
        assert!((config.anchor_zone_fraction - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.padding(), Padding::default());
        assert_eq!(config.label(), "TRANSACTIONS");
        assert_eq!(
            config.termination_policy,
            TerminationPolicy::KeywordTerminator {
                keywords: vec!["PRIMARY KEY".to_owned(), "CONSTRAINT".to_owned()],
                require_upper_case: false,
            }
        );
    }

    #[test]
    fn row_shape_min_tokens_defaults_to_three() {
        let policy: TerminationPolicy =
            toml::from_str("kind = \"row_shape\"\nvocabulary = [\"number\"]").unwrap();
        assert_eq!(
            policy,
            TerminationPolicy::RowShape {
                vocabulary: vec!["number".to_owned()],
                min_tokens: 3,
            }
        );
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        assert!(toml::from_str::<ExtractionConfig>("anchor_zone = 0.2").is_err());
    }

    #[test]
    fn any_of_label_joins_keywords() {
        let pattern = AnchorPattern::AnyOf {
            values: vec!["TRANSACTION".to_owned(), "TRAN_SUMS".to_owned()],
        };
        assert_eq!(pattern.label(), "TRANSACTION / TRAN_SUMS");
    }
}
