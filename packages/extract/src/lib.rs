#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Anchored table-region extraction.
//!
//! For every page of a [`DocumentSource`], an [`Extractor`] locates the
//! anchor fragment that introduces the target table, collects the table
//! body below it until the configured [`TerminationPolicy`] stops, pads the
//! body into a [`TableRegion`] and hands the region to the extractor for
//! the configured [`OutputMode`]. Pages are processed strictly in order and
//! the [`assembler::Assembler`] combines their results into one
//! [`RunReport`].
//!
//! Pages without a table are skipped and logged, never treated as errors.
//! Only an unreadable source aborts a run.
//!
//! [`TerminationPolicy`]: tabcrop_extract_models::TerminationPolicy

pub mod anchor;
pub mod assembler;
pub mod columns;
pub mod config;
pub mod extractors;
pub mod progress;
pub mod region;
pub mod terminator;

use std::sync::Arc;

use tabcrop_extract_models::{
    AnchorMatch, ExtractionConfig, ExtractionResult, HorizontalBounds, OutputMode, RunReport,
    SkipReason, TableRegion,
};
use tabcrop_layout::{DocumentSource, LayoutError, PageRenderer};
use tabcrop_layout_models::PageLayout;

use crate::anchor::{AnchorConstraints, Matcher};
use crate::assembler::Assembler;
use crate::config::ConfigError;
use crate::progress::ProgressCallback;
use crate::region::RegionSettings;

/// Errors that abort an extraction run.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The source document could not be read or decoded.
    #[error("Source error: {0}")]
    Source(#[from] LayoutError),

    /// A matched region could not be rasterized.
    #[error("Render error on page {page}: {source}")]
    Render {
        /// One-based page number.
        page: usize,
        source: LayoutError,
    },
}

/// What a single page produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Extracted(ExtractionResult),
    Skipped(SkipReason),
}

/// A validated, compiled extraction job.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractionConfig,
    matcher: Option<Matcher>,
    constraints: AnchorConstraints,
}

impl Extractor {
    /// Validates `config` and compiles its anchor pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the job is invalid or a regex anchor does
    /// not compile.
    pub fn new(config: ExtractionConfig) -> Result<Self, ConfigError> {
        config::validate(&config)?;
        let matcher = config
            .anchor_pattern
            .as_ref()
            .map(Matcher::compile)
            .transpose()?;
        let constraints = AnchorConstraints::from_config(&config);

        Ok(Self {
            config,
            matcher,
            constraints,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Locates the anchor on `page`. Always `None` for jobs without an
    /// anchor pattern.
    #[must_use]
    pub fn locate(&self, page: &PageLayout) -> Option<AnchorMatch> {
        let matcher = self.matcher.as_ref()?;
        anchor::locate(
            page,
            self.config.anchor_granularity,
            matcher,
            &self.constraints,
        )
    }

    /// Resolves the table region on `page`.
    ///
    /// # Errors
    ///
    /// Returns the [`SkipReason`] when the page has no usable table.
    pub fn region(&self, page: &PageLayout) -> Result<TableRegion, SkipReason> {
        let anchor_bottom = self.anchor_bottom(page)?;

        let body = terminator::collect_body(
            page,
            anchor_bottom,
            &self.config.termination_policy,
            &self.config.start_after,
        );
        if body.is_empty() {
            return Err(SkipReason::EmptyBody);
        }

        region::resolve(&body, page, &self.region_settings()).ok_or(SkipReason::EmptyRegion)
    }

    /// Runs the job on one page.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Render`] if rendering the region fails.
    pub fn extract_page(
        &self,
        page: &PageLayout,
        page_index: usize,
        renderer: &dyn PageRenderer,
    ) -> Result<PageOutcome, ExtractError> {
        if self.config.output_mode == OutputMode::Passthrough {
            return Ok(match self.select_page(page) {
                Ok(()) => PageOutcome::Extracted(extractors::passthrough(page_index)),
                Err(reason) => PageOutcome::Skipped(reason),
            });
        }

        let region = match self.region(page) {
            Ok(region) => region,
            Err(reason) => return Ok(PageOutcome::Skipped(reason)),
        };

        let result = match self.config.output_mode {
            OutputMode::Image => {
                extractors::image(page, &region, renderer, self.config.raster_dpi).map_err(
                    |source| ExtractError::Render {
                        page: page_index + 1,
                        source,
                    },
                )?
            }
            OutputMode::Text => extractors::text(page, &region),
            OutputMode::Structured => match extractors::structured(page, &region) {
                Ok(result) => result,
                Err(reason) => {
                    log::warn!("Page {}: discarding table ({reason})", page_index + 1);
                    return Ok(PageOutcome::Skipped(reason));
                }
            },
            OutputMode::Passthrough => extractors::passthrough(page_index),
        };

        Ok(PageOutcome::Extracted(result))
    }

    /// Runs the job over every page of `source`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if a page cannot be decoded or rendered.
    /// Nothing is returned for the pages processed before the failure.
    pub fn run(
        &self,
        source: &dyn DocumentSource,
        renderer: &dyn PageRenderer,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<RunReport, ExtractError> {
        let page_count = source.page_count();
        let label = self.config.label();

        log::info!(
            "Scanning {page_count} page(s) for {label} ({} policy, {} output)",
            self.config.termination_policy.name(),
            self.config.output_mode
        );

        progress.begin(page_count);
        let mut assembler = Assembler::new(self.config.output_mode, label.clone());

        for index in 0..page_count {
            let page = source.page(index)?;

            match self.extract_page(&page, index, renderer)? {
                PageOutcome::Extracted(result) => {
                    log::info!("Page {}: found {label} table", index + 1);
                    assembler.push(index, result);
                }
                PageOutcome::Skipped(reason) => assembler.record_skip(index, reason),
            }

            progress.page_done(index, assembler.matched());
        }

        let report = assembler.finish();
        progress.finish(&report.summary);
        log::info!(
            "Run complete: {} of {} page(s) matched ({})",
            report.summary.pages_matched,
            report.summary.pages_scanned,
            report.summary.outcome
        );

        Ok(report)
    }

    fn anchor_bottom(&self, page: &PageLayout) -> Result<Option<f64>, SkipReason> {
        if self.matcher.is_none() {
            return Ok(None);
        }
        self.locate(page)
            .map(|found| Some(found.header_bottom))
            .ok_or(SkipReason::NoAnchor)
    }

    /// Passthrough only needs the anchor. Jobs without one select pages
    /// with a non-empty body.
    fn select_page(&self, page: &PageLayout) -> Result<(), SkipReason> {
        if self.matcher.is_some() {
            return self.anchor_bottom(page).map(|_| ());
        }
        self.region(page).map(|_| ())
    }

    fn region_settings(&self) -> RegionSettings {
        let settings = RegionSettings::from_config(&self.config);
        if self.config.output_mode == OutputMode::Image {
            settings.with_horizontal(HorizontalBounds::FullWidth)
        } else {
            settings
        }
    }
}

#[cfg(test)]
mod tests {
    use tabcrop_extract_models::{
        AnchorPattern, Artifact, Outcome, RunSummary, StructuredTable, TerminationPolicy,
    };
    use tabcrop_layout::pdf::PdfTextSource;
    use tabcrop_layout::WireframeRenderer;
    use tabcrop_layout_models::BBox;

    use super::*;
    use crate::progress::null_progress;

    const ROW_HEIGHT: f64 = 12.0;

    /// One block per text, 20 units apart. The first block sits at
    /// 8 % of the page height.
    fn page(texts: &[&str]) -> PageLayout {
        let mut page = PageLayout::new(612.0, 792.0);
        for (i, text) in texts.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let top = (i as f64).mul_add(20.0, 0.08 * 792.0 - ROW_HEIGHT);
            page = page.with_block(BBox::new(36.0, top, 576.0, top + ROW_HEIGHT), *text);
        }
        page
    }

    fn keyword_job(mode: OutputMode) -> ExtractionConfig {
        ExtractionConfig {
            anchor_pattern: Some(AnchorPattern::Exact {
                value: "TRANSACTIONS".to_owned(),
            }),
            termination_policy: TerminationPolicy::KeywordTerminator {
                keywords: vec![
                    "PRIMARY KEY".to_owned(),
                    "FOREIGN KEY".to_owned(),
                    "REFERENCES".to_owned(),
                    "CONSTRAINT".to_owned(),
                ],
                require_upper_case: false,
            },
            output_mode: mode,
            ..ExtractionConfig::default()
        }
    }

    fn extract(job: ExtractionConfig, page: &PageLayout) -> PageOutcome {
        Extractor::new(job)
            .unwrap()
            .extract_page(page, 0, &WireframeRenderer::default())
            .unwrap()
    }

    fn table(outcome: PageOutcome) -> StructuredTable {
        match outcome {
            PageOutcome::Extracted(ExtractionResult::Structured(table)) => table,
            other => panic!("expected structured table, got {other:?}"),
        }
    }

    #[test]
    fn keyword_terminated_table_is_column_split() {
        let page = page(&[
            "TRANSACTIONS",
            "DATE   AMOUNT   DESC",
            "2024-01-01   100.00   Coffee",
            "PRIMARY KEY (id)",
        ]);
        let table = table(extract(keyword_job(OutputMode::Structured), &page));

        let mut expected = StructuredTable::new(&["DATE", "AMOUNT", "DESC"]);
        expected.push_row(&["2024-01-01", "100.00", "Coffee"]);
        assert_eq!(table, expected);
    }

    #[test]
    fn short_row_leaves_columns_empty() {
        let page = page(&[
            "TRANSACTIONS",
            "DATE   AMOUNT   DESC",
            "2024-01-01   100.00",
            "PRIMARY KEY (id)",
        ]);
        let table = table(extract(keyword_job(OutputMode::Structured), &page));

        assert_eq!(table.columns(), ["DATE", "AMOUNT", "DESC"]);
        assert_eq!(table.row_count(), 0);
        for column in table.columns() {
            assert!(table.column(column).unwrap().is_empty());
        }
    }

    #[test]
    fn page_without_anchor_is_skipped() {
        let page = page(&["BALANCES", "DATE   AMOUNT   DESC", "1   2   3"]);
        assert_eq!(
            extract(keyword_job(OutputMode::Structured), &page),
            PageOutcome::Skipped(SkipReason::NoAnchor)
        );
    }

    #[test]
    fn anchor_below_zone_is_ignored() {
        let mut low = page(&["intro"; 8]);
        low = low.with_block(BBox::new(36.0, 200.0, 200.0, 212.0), "TRANSACTIONS");
        assert_eq!(
            extract(keyword_job(OutputMode::Text), &low),
            PageOutcome::Skipped(SkipReason::NoAnchor)
        );
    }

    #[test]
    fn row_shape_job_scans_whole_page() {
        let job = ExtractionConfig {
            termination_policy: TerminationPolicy::RowShape {
                vocabulary: vec!["number".to_owned(), "varchar".to_owned(), "date".to_owned()],
                min_tokens: 3,
            },
            output_mode: OutputMode::Text,
            ..ExtractionConfig::default()
        };
        let page = page(&["CUSTOMERS", "id number", "id number primary", "Notes"]);

        assert_eq!(
            extract(job, &page),
            PageOutcome::Extracted(ExtractionResult::PlainText(vec![
                "id number primary".to_owned()
            ]))
        );
    }

    #[test]
    fn heading_with_only_anchor_has_empty_body() {
        let job = ExtractionConfig {
            anchor_pattern: Some(AnchorPattern::Exact {
                value: "TRANSACTIONS".to_owned(),
            }),
            ..ExtractionConfig::default()
        };
        let page = page(&["TRANSACTIONS", "BALANCES", "1  2"]);
        assert_eq!(extract(job, &page), PageOutcome::Skipped(SkipReason::EmptyBody));
    }

    #[test]
    fn nothing_after_terminator_is_included() {
        let page = page(&[
            "TRANSACTIONS",
            "DATE   AMOUNT",
            "2024-01-01   1.00",
            "CONSTRAINT pk",
            "2024-01-02   2.00",
            "2024-01-03   3.00",
        ]);
        let extractor = Extractor::new(keyword_job(OutputMode::Text)).unwrap();
        let region = extractor.region(&page).unwrap();

        assert_eq!(region.fragments.len(), 2);
        assert!(region.bbox.bottom < page.blocks[3].bbox.top);
    }

    #[test]
    fn trimmed_away_body_is_skipped() {
        let mut job = keyword_job(OutputMode::Structured);
        job.padding_above = -1.0;
        job.padding_below = -1.0;
        let page = page(&["TRANSACTIONS", "DATE   AMOUNT", "CONSTRAINT pk"]);
        assert_eq!(
            extract(job, &page),
            PageOutcome::Skipped(SkipReason::EmptyRegion)
        );
    }

    #[test]
    fn image_job_renders_full_width() {
        let mut job = keyword_job(OutputMode::Image);
        job.raster_dpi = 72;
        job.horizontal_bounds = HorizontalBounds::FragmentUnion;
        let page = page(&["TRANSACTIONS", "DATE   AMOUNT", "1   2", "REFERENCES x"]);

        let PageOutcome::Extracted(ExtractionResult::Raster(image)) = extract(job, &page) else {
            panic!("expected raster");
        };
        assert_eq!(image.width, 612);
        assert_eq!(image.dpi, 72);
    }

    struct FailingRenderer;

    impl PageRenderer for FailingRenderer {
        fn render(
            &self,
            _page: &PageLayout,
            _rect: &BBox,
            _dpi: u32,
        ) -> Result<tabcrop_layout_models::RasterImage, LayoutError> {
            Err(LayoutError::Render("pixmap allocation failed".to_owned()))
        }
    }

    #[test]
    fn render_failure_is_reported_as_render_error() {
        let job = keyword_job(OutputMode::Image);
        let page = page(&["TRANSACTIONS", "DATE   AMOUNT", "1   2", "REFERENCES x"]);
        let err = Extractor::new(job)
            .unwrap()
            .extract_page(&page, 2, &FailingRenderer)
            .unwrap_err();

        assert!(matches!(
            err,
            ExtractError::Render {
                page: 3,
                source: LayoutError::Render(_)
            }
        ));
    }

    #[test]
    fn passthrough_needs_only_the_anchor() {
        let job = keyword_job(OutputMode::Passthrough);
        let page = page(&["TRANSACTIONS", "CONSTRAINT pk"]);
        assert_eq!(
            Extractor::new(job)
                .unwrap()
                .extract_page(&page, 6, &WireframeRenderer::default())
                .unwrap(),
            PageOutcome::Extracted(ExtractionResult::Passthrough { page_index: 6 })
        );
    }

    #[test]
    fn invalid_regex_is_a_config_error() {
        let job = ExtractionConfig {
            anchor_pattern: Some(AnchorPattern::Regex {
                value: "(unclosed".to_owned(),
            }),
            ..ExtractionConfig::default()
        };
        assert!(matches!(Extractor::new(job), Err(ConfigError::Regex(_))));
    }

    // ── Whole runs ───────────────────────────────────────────────────────

    const STATEMENT: &str = "TRANSACTIONS\n\
                             DATE   AMOUNT   DESC\n\
                             2024-01-01   100.00   Coffee\n\
                             FOREIGN KEY (acct)";

    fn run(job: ExtractionConfig, pages: &[&str]) -> RunReport {
        let source = PdfTextSource::from_page_texts(pages);
        Extractor::new(job)
            .unwrap()
            .run(&source, &WireframeRenderer::default(), &null_progress())
            .unwrap()
    }

    #[test]
    fn one_match_yields_a_single_table() {
        let report = run(
            keyword_job(OutputMode::Structured),
            &["cover page", STATEMENT, "appendix"],
        );

        assert_eq!(report.summary.pages_scanned, 3);
        assert_eq!(report.summary.pages_matched, 1);
        assert_eq!(report.summary.outcome, Outcome::Matched);
        assert!(matches!(report.artifact, Some(Artifact::Table(_))));
    }

    #[test]
    fn several_matches_yield_a_list_in_page_order() {
        let second = STATEMENT.replace("Coffee", "Tea");
        let report = run(
            keyword_job(OutputMode::Structured),
            &[STATEMENT, "cover", second.as_str()],
        );

        let Some(Artifact::Tables(tables)) = report.artifact else {
            panic!("expected list of tables");
        };
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].column("DESC").unwrap(), ["Coffee".to_owned()]);
        assert_eq!(tables[1].column("DESC").unwrap(), ["Tea".to_owned()]);
    }

    #[test]
    fn no_match_is_reported_without_artifact() {
        let report = run(keyword_job(OutputMode::Text), &["cover", "appendix"]);
        assert_eq!(report.summary.outcome, Outcome::NoMatch);
        assert_eq!(report.summary.pages_matched, 0);
        assert!(report.artifact.is_none());
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: std::sync::Mutex<Vec<String>>,
    }

    impl ProgressCallback for RecordingProgress {
        fn begin(&self, page_count: usize) {
            self.events.lock().unwrap().push(format!("begin {page_count}"));
        }

        fn page_done(&self, page_index: usize, matched: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("page {page_index} {matched}"));
        }

        fn finish(&self, summary: &RunSummary) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finish {}", summary.outcome));
        }
    }

    #[test]
    fn progress_sees_every_page_in_order() {
        let recorder = Arc::new(RecordingProgress::default());
        let progress: Arc<dyn ProgressCallback> = recorder.clone();
        let source = PdfTextSource::from_page_texts(&[STATEMENT, "cover", STATEMENT]);

        Extractor::new(keyword_job(OutputMode::Structured))
            .unwrap()
            .run(&source, &WireframeRenderer::default(), &progress)
            .unwrap();

        assert_eq!(
            *recorder.events.lock().unwrap(),
            [
                "begin 3",
                "page 0 1",
                "page 1 1",
                "page 2 2",
                format!("finish {}", Outcome::Matched).as_str(),
            ]
        );
    }

    #[test]
    fn repeated_runs_are_identical() {
        let pages = [STATEMENT, "cover", STATEMENT];
        for mode in [OutputMode::Structured, OutputMode::Text, OutputMode::Image] {
            assert_eq!(
                run(keyword_job(mode), &pages),
                run(keyword_job(mode), &pages)
            );
        }
    }

    #[test]
    fn text_run_captions_each_page() {
        let report = run(keyword_job(OutputMode::Text), &["cover", STATEMENT]);
        let Some(Artifact::Document(pages)) = report.artifact else {
            panic!("expected document");
        };
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 2);
        assert_eq!(pages[0].caption, "Page 2 - TRANSACTIONS Table");
    }
}
