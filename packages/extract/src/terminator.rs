//! Table body collection.
//!
//! Walks the page's block fragments in reading order below the anchor and
//! asks a [`Terminator`] about each one. The terminator includes, skips, or
//! stops; once it has stopped it stays stopped, and nothing after the stop
//! point is looked at again.

use tabcrop_extract_models::TerminationPolicy;
use tabcrop_layout_models::{Fragment, Granularity, PageLayout};

use crate::anchor::reading_order;

/// What to do with one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Part of the table body.
    Include,
    /// Not part of the body, keep scanning.
    Skip,
    /// End of the table. Scanning is over for this page.
    Stop,
}

/// Per-page scanning state for one [`TerminationPolicy`].
#[derive(Debug)]
pub struct Terminator<'a> {
    policy: &'a TerminationPolicy,
    /// Lower-cased row vocabulary (row-shape only).
    vocabulary: Vec<String>,
    /// Upper-cased terminator keywords (keyword-terminator only).
    keywords: Vec<String>,
    /// Row-shape: a row has been seen.
    collecting: bool,
    stopped: bool,
}

impl<'a> Terminator<'a> {
    #[must_use]
    pub fn new(policy: &'a TerminationPolicy) -> Self {
        let (vocabulary, keywords) = match policy {
            TerminationPolicy::RowShape { vocabulary, .. } => {
                (vocabulary.iter().map(|v| v.to_lowercase()).collect(), Vec::new())
            }
            TerminationPolicy::KeywordTerminator { keywords, .. } => {
                (Vec::new(), keywords.iter().map(|k| k.to_uppercase()).collect())
            }
            TerminationPolicy::HeadingBreak { .. } => (Vec::new(), Vec::new()),
        };

        Self {
            policy,
            vocabulary,
            keywords,
            collecting: false,
            stopped: false,
        }
    }

    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Classifies the next fragment in reading order. Always returns
    /// [`Decision::Stop`] once the terminator has stopped.
    pub fn feed(&mut self, fragment: &Fragment) -> Decision {
        if self.stopped {
            return Decision::Stop;
        }

        let text = fragment.trimmed();
        let decision = match self.policy {
            TerminationPolicy::HeadingBreak {
                continuation_prefix,
            } => {
                if text.is_empty() {
                    Decision::Skip
                } else if is_upper_case(text)
                    && !continuation_prefix
                        .as_deref()
                        .is_some_and(|prefix| text.starts_with(prefix))
                {
                    Decision::Stop
                } else {
                    Decision::Include
                }
            }
            TerminationPolicy::KeywordTerminator {
                require_upper_case,
                ..
            } => {
                if text.is_empty() {
                    Decision::Skip
                } else if self.has_keyword(text) && (!require_upper_case || is_upper_case(text)) {
                    Decision::Stop
                } else {
                    Decision::Include
                }
            }
            TerminationPolicy::RowShape { min_tokens, .. } => {
                let row = self.is_row(text, *min_tokens);
                match (self.collecting, row) {
                    (false, false) => Decision::Skip,
                    (false, true) => {
                        self.collecting = true;
                        Decision::Include
                    }
                    (true, true) => Decision::Include,
                    (true, false) => Decision::Stop,
                }
            }
        };

        if decision == Decision::Stop {
            log::debug!("{} stop at {text:?}", self.policy.name());
            self.stopped = true;
        }

        decision
    }

    /// Checks a fragment seen before the body has opened. Only the
    /// keyword terminator stops there.
    pub fn feed_preamble(&mut self, fragment: &Fragment) -> bool {
        if self.stopped {
            return true;
        }
        let text = fragment.trimmed();
        if let TerminationPolicy::KeywordTerminator {
            require_upper_case,
            ..
        } = self.policy
        {
            if self.has_keyword(text) && (!require_upper_case || is_upper_case(text)) {
                log::debug!("{} stop before body at {text:?}", self.policy.name());
                self.stopped = true;
            }
        }
        self.stopped
    }

    fn has_keyword(&self, text: &str) -> bool {
        let upper = text.to_uppercase();
        self.keywords.iter().any(|k| upper.contains(k.as_str()))
    }

    fn is_row(&self, text: &str, min_tokens: usize) -> bool {
        let lower = text.to_lowercase();
        self.vocabulary.iter().any(|v| lower.contains(v.as_str()))
            && text.split_whitespace().count() >= min_tokens
    }
}

/// Returns `true` when `text` has at least one cased character and no
/// lower-case ones.
#[must_use]
pub fn is_upper_case(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

fn has_all_phrases(text: &str, phrases: &[String]) -> bool {
    let lower = text.to_lowercase();
    phrases.iter().all(|p| lower.contains(&p.to_lowercase()))
}

/// Collects the table body.
///
/// Only block fragments whose top lies strictly below `anchor_bottom` are
/// considered; with no anchor the whole page is scanned. When
/// `start_after` is non-empty, fragments are ignored until one contains
/// every phrase in it (case-insensitive); that fragment opens the body and
/// is included as is. A keyword terminator still ends the scan while the
/// marker has not been seen.
#[must_use]
pub fn collect_body(
    page: &PageLayout,
    anchor_bottom: Option<f64>,
    policy: &TerminationPolicy,
    start_after: &[String],
) -> Vec<Fragment> {
    let blocks = page.fragments(Granularity::Block);
    let mut terminator = Terminator::new(policy);
    let mut started = start_after.is_empty();
    let mut body = Vec::new();

    for fragment in reading_order(&blocks) {
        if terminator.is_stopped() {
            break;
        }
        if anchor_bottom.is_some_and(|bottom| fragment.bbox.top <= bottom) {
            continue;
        }
        if !started {
            if terminator.feed_preamble(fragment) {
                break;
            }
            if has_all_phrases(&fragment.text, start_after) {
                started = true;
                body.push(fragment.clone());
            }
            continue;
        }
        if terminator.feed(fragment) == Decision::Include {
            body.push(fragment.clone());
        }
    }

    log::debug!(
        "{} collected {} body fragments",
        policy.name(),
        body.len()
    );

    body
}
