#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `tabcrop` binary: the page bar and logger
//! setup. Log lines go through `indicatif-log-bridge` so they print above
//! the bar.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use tabcrop_extract::progress::ProgressCallback;
use tabcrop_extract_models::{Outcome, RunSummary};

pub use indicatif::MultiProgress;

const PAGE_TEMPLATE: &str =
    "{prefix:.bold} {wide_bar:.cyan/dim} page {pos}/{len} ({msg}) [{elapsed_precise}]";

/// Page bar for one extraction run.
pub struct IndicatifProgress {
    bar: ProgressBar,
    label: String,
    last_matched: AtomicUsize,
}

impl IndicatifProgress {
    /// Adds a bar for scanning a document for the `label` table.
    #[must_use]
    pub fn pages_bar(multi: &MultiProgress, label: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new(0));
        bar.set_style(
            ProgressStyle::with_template(PAGE_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_prefix(label.to_string());

        Arc::new(Self {
            bar,
            label: label.to_string(),
            last_matched: AtomicUsize::new(0),
        })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn begin(&self, page_count: usize) {
        self.bar.set_length(page_count as u64);
        self.bar.set_position(0);
        self.bar.set_message("0 matched");
    }

    fn page_done(&self, page_index: usize, matched: usize) {
        if self.last_matched.swap(matched, Ordering::Relaxed) != matched {
            self.bar.set_message(format!("{matched} matched"));
        }
        self.bar.set_position(page_index as u64 + 1);
    }

    fn finish(&self, summary: &RunSummary) {
        let msg = match summary.outcome {
            Outcome::Matched => format!(
                "{} of {} page(s) matched",
                summary.pages_matched, summary.pages_scanned
            ),
            Outcome::NoMatch => format!("no {} table", self.label),
        };
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` (filtered by `RUST_LOG`) behind
/// `indicatif-log-bridge` and returns the [`MultiProgress`] bars must join.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}
