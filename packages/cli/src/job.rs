//! Job assembly: a TOML job file with command-line overrides on top.

use std::path::PathBuf;

use tabcrop_extract::config::{self, ConfigError};
use tabcrop_extract_models::{AnchorPattern, ExtractionConfig, OutputMode};

/// Command-line options that override the job file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub mode: Option<OutputMode>,
    /// Exact anchor text.
    pub anchor: Option<String>,
    pub label: Option<String>,
    pub dpi: Option<u32>,
}

/// Loads the job file (or defaults) and applies `overrides`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the job file cannot be loaded or the final
/// job is invalid.
pub fn build(overrides: &Overrides) -> Result<ExtractionConfig, ConfigError> {
    let mut job = match &overrides.config {
        Some(path) => config::load_config(path)?,
        None => ExtractionConfig::default(),
    };

    if let Some(mode) = overrides.mode {
        job.output_mode = mode;
    }
    if let Some(anchor) = &overrides.anchor {
        job.anchor_pattern = Some(AnchorPattern::Exact {
            value: anchor.clone(),
        });
    }
    if let Some(label) = &overrides.label {
        job.anchor_label = Some(label.clone());
    }
    if let Some(dpi) = overrides.dpi {
        job.raster_dpi = dpi;
    }

    config::validate(&job)?;

    Ok(job)
}
