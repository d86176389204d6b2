//! Anchor location.
//!
//! Finds the header fragment that introduces the target table. Fragments
//! are visited top to bottom (ties broken by left edge, then decoder
//! order) and the first one that matches the pattern and satisfies every
//! positional constraint wins. Later candidates on the same page are never
//! considered, so exactly one anchor is used per page.

use regex::Regex;
use tabcrop_extract_models::{AnchorMatch, AnchorPattern, ExtractionConfig, RuleRequirement};
use tabcrop_layout_models::{BBox, Fragment, Granularity, PageLayout};

/// A compiled [`AnchorPattern`].
#[derive(Debug, Clone)]
pub enum Matcher {
    Exact(String),
    /// Lower-cased needles, any of which may match.
    Contains(Vec<String>),
    Regex(Regex),
}

impl Matcher {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if a regex pattern does not compile.
    pub fn compile(pattern: &AnchorPattern) -> Result<Self, regex::Error> {
        Ok(match pattern {
            AnchorPattern::Exact { value } => Self::Exact(value.clone()),
            AnchorPattern::Contains { value } => Self::Contains(vec![value.to_lowercase()]),
            AnchorPattern::AnyOf { values } => {
                Self::Contains(values.iter().map(|v| v.to_lowercase()).collect())
            }
            AnchorPattern::Regex { value } => Self::Regex(Regex::new(value)?),
        })
    }

    /// Tests the trimmed `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        let text = text.trim();
        match self {
            Self::Exact(value) => text == value,
            Self::Contains(needles) => {
                let lower = text.to_lowercase();
                needles.iter().any(|n| lower.contains(n.as_str()))
            }
            Self::Regex(re) => re.is_match(text),
        }
    }
}

/// Which side of the anchor a required rule must be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSide {
    /// The rule runs above the anchor (the anchor sits beneath it).
    Above,
    /// The rule runs below the anchor.
    Below,
}

/// Positional constraints on the anchor. Every set constraint must hold.
#[derive(Debug, Clone, Default)]
pub struct AnchorConstraints {
    /// Anchor bottom must be `< zone_fraction * page.height`.
    pub zone_fraction: Option<f64>,
    /// Anchor left edge must be `>= fraction * page.width`.
    pub right_aligned_fraction: Option<f64>,
    /// Required colored rules.
    pub rules: Vec<(RuleSide, RuleRequirement)>,
}

impl AnchorConstraints {
    /// Builds the constraint set described by `config`.
    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let mut rules = Vec::new();
        if let Some(req) = &config.require_line_above {
            rules.push((RuleSide::Above, req.clone()));
        }
        if let Some(req) = &config.require_line_below {
            rules.push((RuleSide::Below, req.clone()));
        }

        Self {
            zone_fraction: Some(config.anchor_zone_fraction),
            right_aligned_fraction: config
                .require_right_aligned
                .then_some(config.right_aligned_fraction),
            rules,
        }
    }

    fn allows(&self, bbox: &BBox, page: &PageLayout) -> bool {
        if let Some(fraction) = self.zone_fraction {
            if bbox.bottom >= fraction * page.height {
                return false;
            }
        }

        if let Some(fraction) = self.right_aligned_fraction {
            if bbox.left < fraction * page.width {
                return false;
            }
        }

        self.rules
            .iter()
            .all(|(side, req)| has_rule(page, bbox, *side, req))
    }
}

fn has_rule(page: &PageLayout, bbox: &BBox, side: RuleSide, req: &RuleRequirement) -> bool {
    page.rules()
        .iter()
        .filter(|rule| rule.is_horizontal() && rule.has_color(req.color_class))
        .any(|rule| match side {
            RuleSide::Above => rule.y() <= bbox.top + req.tolerance,
            RuleSide::Below => rule.y() + req.tolerance >= bbox.bottom,
        })
}

/// Returns `fragments` ordered top to bottom, then left to right. The sort
/// is stable, so fragments sharing both edges keep decoder order.
#[must_use]
pub fn reading_order(fragments: &[Fragment]) -> Vec<&Fragment> {
    let mut sorted: Vec<&Fragment> = fragments.iter().collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.left.total_cmp(&b.bbox.left))
    });
    sorted
}

/// Finds the first fragment at `granularity` matching `matcher` under
/// `constraints`.
#[must_use]
pub fn locate(
    page: &PageLayout,
    granularity: Granularity,
    matcher: &Matcher,
    constraints: &AnchorConstraints,
) -> Option<AnchorMatch> {
    let fragments = page.fragments(granularity);

    let found = reading_order(&fragments)
        .into_iter()
        .find(|f| matcher.is_match(&f.text) && constraints.allows(&f.bbox, page))?;

    log::debug!(
        "Anchor {:?} at top={:.1} bottom={:.1}",
        found.trimmed(),
        found.bbox.top,
        found.bbox.bottom
    );

    Some(AnchorMatch {
        fragment: found.clone(),
        header_bottom: found.bbox.bottom,
    })
}
