//! Region resolution: from body fragments to a padded rectangle.

use tabcrop_extract_models::{ExtractionConfig, HorizontalBounds, Padding, TableRegion};
use tabcrop_layout_models::{BBox, Fragment, PageLayout};

/// Geometry settings for [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSettings {
    pub padding: Padding,
    pub horizontal: HorizontalBounds,
    /// Region bottom never extends past this fraction of the page height.
    pub footer_exclusion_fraction: Option<f64>,
}

impl RegionSettings {
    #[must_use]
    pub const fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            padding: config.padding(),
            horizontal: config.horizontal_bounds,
            footer_exclusion_fraction: config.footer_exclusion_fraction,
        }
    }

    /// Same settings with the horizontal extent forced to `bounds`.
    #[must_use]
    pub const fn with_horizontal(mut self, bounds: HorizontalBounds) -> Self {
        self.horizontal = bounds;
        self
    }
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            padding: Padding::default(),
            horizontal: HorizontalBounds::FullWidth,
            footer_exclusion_fraction: None,
        }
    }
}

/// Turns the collected `body` into a [`TableRegion`].
///
/// The vertical extent covers every body fragment plus padding, clamped to
/// the page and to the footer limit. Fragments whose vertical span no
/// longer fits after clamping are left out of the region. Returns `None`
/// when `body` is empty, the clamped box has no height, or no fragment is
/// left inside it.
#[must_use]
pub fn resolve(body: &[Fragment], page: &PageLayout, settings: &RegionSettings) -> Option<TableRegion> {
    let covered = body
        .iter()
        .map(|f| f.bbox)
        .reduce(|acc, b| acc.union(&b))?;

    let top = (covered.top - settings.padding.above).max(0.0);
    let mut bottom = (covered.bottom + settings.padding.below).min(page.height);
    if let Some(fraction) = settings.footer_exclusion_fraction {
        bottom = bottom.min(fraction * page.height);
    }

    if top >= bottom {
        log::debug!("Degenerate region: top {top:.1} >= bottom {bottom:.1}");
        return None;
    }

    let (left, right) = match settings.horizontal {
        HorizontalBounds::FullWidth => (0.0, page.width),
        HorizontalBounds::FragmentUnion => (covered.left.max(0.0), covered.right.min(page.width)),
    };

    let bbox = BBox::new(left, top, right, bottom);
    let fragments: Vec<Fragment> = body
        .iter()
        .filter(|f| bbox.contains_vertical_span(&f.bbox))
        .cloned()
        .collect();
    if fragments.is_empty() {
        log::debug!("Region {bbox:?} keeps no body fragments");
        return None;
    }

    Some(TableRegion { bbox, fragments })
}
