//! Job file loading and validation.

use std::path::Path;

use tabcrop_extract_models::{AnchorPattern, ExtractionConfig, TerminationPolicy};

/// Errors raised while loading or validating an [`ExtractionConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A regex anchor pattern does not compile.
    #[error("Invalid anchor regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Reads and validates a TOML job file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, is not valid TOML,
/// or describes an unusable job.
pub fn load_config(path: &Path) -> Result<ExtractionConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = from_toml_str(&content)?;
    log::debug!("Loaded job from {}", path.display());
    Ok(config)
}

/// Parses and validates a TOML job.
///
/// # Errors
///
/// Returns [`ConfigError`] if the TOML is malformed or the job is invalid.
pub fn from_toml_str(content: &str) -> Result<ExtractionConfig, ConfigError> {
    let config: ExtractionConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Checks cross-field rules that serde cannot express.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] describing the first problem found.
pub fn validate(config: &ExtractionConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| -> Result<(), ConfigError> {
        Err(ConfigError::Invalid(msg.to_owned()))
    };

    match &config.anchor_pattern {
        None if !matches!(config.termination_policy, TerminationPolicy::RowShape { .. }) => {
            return invalid("anchor_pattern is required unless termination_policy is row_shape");
        }
        Some(AnchorPattern::AnyOf { values }) if values.is_empty() => {
            return invalid("anchor_pattern.values must not be empty");
        }
        Some(
            AnchorPattern::Exact { value }
            | AnchorPattern::Contains { value }
            | AnchorPattern::Regex { value },
        ) if value.trim().is_empty() => {
            return invalid("anchor_pattern.value must not be empty");
        }
        _ => {}
    }

    match &config.termination_policy {
        TerminationPolicy::KeywordTerminator { keywords, .. } if keywords.is_empty() => {
            return invalid("termination_policy.keywords must not be empty");
        }
        TerminationPolicy::RowShape { vocabulary, .. } if vocabulary.is_empty() => {
            return invalid("termination_policy.vocabulary must not be empty");
        }
        TerminationPolicy::RowShape { min_tokens: 0, .. } => {
            return invalid("termination_policy.min_tokens must be at least 1");
        }
        _ => {}
    }

    if !(config.anchor_zone_fraction > 0.0 && config.anchor_zone_fraction <= 1.0) {
        return invalid("anchor_zone_fraction must be in (0, 1]");
    }
    if !(0.0..=1.0).contains(&config.right_aligned_fraction) {
        return invalid("right_aligned_fraction must be in [0, 1]");
    }
    if let Some(fraction) = config.footer_exclusion_fraction {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return invalid("footer_exclusion_fraction must be in (0, 1]");
        }
    }
    if config.raster_dpi == 0 {
        return invalid("raster_dpi must be positive");
    }

    Ok(())
}
