#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for tabcrop.
//!
//! `tabcrop extract` runs a job over one document and writes the artifact.
//! The process exits with `0` when at least one page matched, `2` when the
//! run finished without a match and `1` on any error.
//!
//! Uses `indicatif-log-bridge` (via [`tabcrop_cli_utils::init_logger`]) so
//! that log lines and the page bar never fight for the terminal.

mod job;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tabcrop_cli_utils::IndicatifProgress;
use tabcrop_extract::Extractor;
use tabcrop_extract_models::{Outcome, OutputMode};
use tabcrop_layout::{DocumentSource, WireframeRenderer};
use tabcrop_layout_models::Granularity;

/// Exit status for a run that completed without a match.
const EXIT_NO_MATCH: u8 = 2;

#[derive(Parser)]
#[command(name = "tabcrop", about = "Anchored table-region extraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the anchored table on every page and write the result
    Extract {
        /// Input document (`.pdf`, or a layout JSON dump)
        input: PathBuf,
        /// Output file, or directory for image output
        #[arg(long, short)]
        output: PathBuf,
        /// TOML job file
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// Output mode (image, text, structured, passthrough)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<OutputMode>,
        /// Exact anchor text (e.g. "TRANSACTIONS")
        #[arg(long)]
        anchor: Option<String>,
        /// Table name used in captions
        #[arg(long)]
        label: Option<String>,
        /// Raster resolution for image output
        #[arg(long)]
        dpi: Option<u32>,
    },
    /// List page sizes and fragment counts
    Inspect {
        /// Input document
        input: PathBuf,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let multi = tabcrop_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            output,
            config,
            mode,
            anchor,
            label,
            dpi,
        } => {
            let job = job::build(&job::Overrides {
                config,
                mode,
                anchor,
                label,
                dpi,
            })?;
            let extractor = Extractor::new(job)?;

            let source = tabcrop_layout::open(&input)?;
            let progress = IndicatifProgress::pages_bar(&multi, &extractor.config().label());
            let report = extractor.run(source.as_ref(), &WireframeRenderer::default(), &progress)?;

            let Some(artifact) = report.artifact else {
                log::warn!(
                    "No {} table found in {} ({} page(s) scanned)",
                    extractor.config().label(),
                    input.display(),
                    report.summary.pages_scanned
                );
                return Ok(ExitCode::from(EXIT_NO_MATCH));
            };
            debug_assert_eq!(report.summary.outcome, Outcome::Matched);

            let written = tabcrop_output::write_artifact(&artifact, &output, source.as_ref())?;
            for path in &written {
                println!("{}", path.display());
            }
        }
        Commands::Inspect { input } => inspect(&input)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_mode(value: &str) -> Result<OutputMode, String> {
    value
        .parse()
        .map_err(|_| format!("unknown output mode {value:?}"))
}

fn inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source: Box<dyn DocumentSource> = tabcrop_layout::open(input)?;

    println!(
        "{:<6} {:>8} {:>8} {:>7} {:>6} {:>6}",
        "PAGE", "WIDTH", "HEIGHT", "BLOCKS", "LINES", "RULES"
    );
    println!("{}", "-".repeat(46));

    for index in 0..source.page_count() {
        let page = source.page(index)?;
        println!(
            "{:<6} {:>8.1} {:>8.1} {:>7} {:>6} {:>6}",
            index + 1,
            page.width,
            page.height,
            page.blocks.len(),
            page.fragments(Granularity::Line).len(),
            page.rules().len()
        );
    }

    Ok(())
}
