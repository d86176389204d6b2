#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Positioned page layout types.
//!
//! A document decoder turns every page into a [`PageLayout`]: text
//! [`Fragment`]s with bounding boxes at two granularities plus the vector
//! [`RuleSegment`]s drawn on the page. Everything downstream (anchor
//! location, region resolution, extraction) works purely on these types.
//!
//! Coordinates are page units with the origin in the top-left corner and
//! `y` growing downward.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// An axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge.
    pub left: f64,
    /// Top edge (smaller `y`).
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge (larger `y`).
    pub bottom: f64,
}

impl BBox {
    /// Creates a bounding box from its four edges.
    #[must_use]
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Returns `true` when the box has no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// Returns `true` when the two boxes share a region of positive area.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Returns `true` when `other`'s vertical span lies within this box's
    /// vertical span.
    #[must_use]
    pub fn contains_vertical_span(&self, other: &Self) -> bool {
        other.top >= self.top && other.bottom <= self.bottom
    }

    #[must_use]
    pub fn vertical_center(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Smallest box covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Styling information for a run of text inside a fragment.
///
/// Carried through for decoders that supply it; the extraction engine
/// never looks at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub size: Option<f64>,
}

/// A positioned unit of page text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Bounding box of the whole fragment.
    pub bbox: BBox,
    /// Text content. May span several lines separated by `\n`.
    pub text: String,
    /// Optional per-span styling.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Span>,
}

impl Fragment {
    /// Creates an unstyled fragment.
    #[must_use]
    pub fn new(bbox: BBox, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
            spans: Vec::new(),
        }
    }

    /// The text with leading and trailing whitespace removed.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// Returns `true` when the fragment holds nothing but whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }
}

/// A point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A stroke color with components in `0.0..=1.0`.
///
/// Serialized as a `[r, g, b]` array, the form most decoders emit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Buckets the color into a coarse [`ColorClass`], if it falls in one.
    #[must_use]
    pub fn classify(&self) -> Option<ColorClass> {
        ColorClass::ALL.iter().copied().find(|class| class.matches(*self))
    }
}

impl From<[f32; 3]> for Rgb {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Coarse stroke color buckets used for ruling-line checks.
///
/// Classes are tested in declaration order, so a very dark color is
/// [`ColorClass::Black`] rather than [`ColorClass::Gray`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColorClass {
    Black,
    Blue,
    Red,
    Green,
    Gray,
}

impl ColorClass {
    pub const ALL: &[Self] = &[Self::Black, Self::Blue, Self::Red, Self::Green, Self::Gray];

    /// Returns `true` when `color` belongs to this class.
    #[must_use]
    pub fn matches(self, color: Rgb) -> bool {
        let Rgb { r, g, b } = color;
        match self {
            Self::Black => r < 0.2 && g < 0.2 && b < 0.2,
            Self::Blue => r < 0.2 && g < 0.2 && b > 0.78,
            Self::Red => r > 0.78 && g < 0.2 && b < 0.2,
            Self::Green => r < 0.2 && g > 0.5 && b < 0.2,
            Self::Gray => {
                let max = r.max(g).max(b);
                let min = r.min(g).min(b);
                let mean = (r + g + b) / 3.0;
                max - min <= 0.05 && (0.2..=0.9).contains(&mean)
            }
        }
    }
}

/// A vector line drawn on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSegment {
    pub start: Point,
    pub end: Point,
    /// Stroke color, when the decoder knows it.
    #[serde(default)]
    pub stroke: Option<Rgb>,
}

impl RuleSegment {
    /// Minimum horizontal run for a segment to count as a horizontal rule.
    pub const MIN_HORIZONTAL_LENGTH: f64 = 100.0;
    /// Maximum vertical drift for a segment to count as a horizontal rule.
    pub const MAX_HORIZONTAL_SLOPE: f64 = 2.0;

    #[must_use]
    pub const fn new(start: Point, end: Point, stroke: Option<Rgb>) -> Self {
        Self { start, end, stroke }
    }

    /// Returns `true` for long, flat segments (ruling lines).
    #[must_use]
    pub fn is_horizontal(&self) -> bool {
        (self.start.x - self.end.x).abs() > Self::MIN_HORIZONTAL_LENGTH
            && (self.start.y - self.end.y).abs() < Self::MAX_HORIZONTAL_SLOPE
    }

    /// The `y` coordinate of the segment's end point.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.end.y
    }

    /// Returns `true` when the stroke color falls in `class`.
    #[must_use]
    pub fn has_color(&self, class: ColorClass) -> bool {
        self.stroke.is_some_and(|c| class.matches(c))
    }
}

/// Fragment granularity requested from a page.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Granularity {
    /// Coarse text blocks (paragraph-sized).
    #[default]
    Block,
    /// Fine line-level fragments.
    Line,
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub width: f64,
    pub height: f64,
    /// Block-level fragments in decoder order.
    #[serde(default)]
    pub blocks: Vec<Fragment>,
    /// Line-level fragments in decoder order. Derived from `blocks` when
    /// the decoder supplies none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Fragment>,
    /// Vector rule segments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleSegment>,
}

impl PageLayout {
    /// Creates an empty page of the given size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            blocks: Vec::new(),
            lines: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Builder-style helper appending a block fragment.
    #[must_use]
    pub fn with_block(mut self, bbox: BBox, text: impl Into<String>) -> Self {
        self.blocks.push(Fragment::new(bbox, text));
        self
    }

    /// Builder-style helper appending a rule segment.
    #[must_use]
    pub fn with_rule(mut self, rule: RuleSegment) -> Self {
        self.rules.push(rule);
        self
    }

    /// The full page rectangle.
    #[must_use]
    pub const fn bbox(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width, self.height)
    }

    /// Fragments at the requested granularity, in decoder order.
    #[must_use]
    pub fn fragments(&self, granularity: Granularity) -> Cow<'_, [Fragment]> {
        match granularity {
            Granularity::Block => Cow::Borrowed(&self.blocks),
            Granularity::Line if !self.lines.is_empty() => Cow::Borrowed(&self.lines),
            Granularity::Line => Cow::Owned(split_blocks_into_lines(&self.blocks)),
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[RuleSegment] {
        &self.rules
    }
}

/// Splits every block into one fragment per text line, giving each line an
/// equal band of the block's height. Blank lines keep their band but are
/// not emitted.
fn split_blocks_into_lines(blocks: &[Fragment]) -> Vec<Fragment> {
    let mut lines = Vec::new();

    for block in blocks {
        let texts: Vec<&str> = block.text.lines().collect();
        if texts.is_empty() {
            continue;
        }

        #[allow(clippy::cast_precision_loss)]
        let band = block.bbox.height() / texts.len() as f64;

        for (i, text) in texts.into_iter().enumerate() {
            if text.trim().is_empty() {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let top = (i as f64).mul_add(band, block.bbox.top);
            lines.push(Fragment::new(
                BBox::new(block.bbox.left, top, block.bbox.right, top + band),
                text,
            ));
        }
    }

    lines
}

/// An RGBA8 pixel buffer produced by rendering part of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Resolution the region was rendered at.
    pub dpi: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}
