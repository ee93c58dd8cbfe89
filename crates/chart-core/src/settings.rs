//! Decoder settings loaded from TOML.
//!
//! - `parse_settings_toml(toml_content)` parses and validates a settings file
//! - `DecoderSettings::default()` uses the embedded `default_settings.toml`
//! - Settings are plain values: callers share one instance read-only across
//!   every sentence they decode, nothing here is process-global.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// `nbest.factor = 0` means "unlimited", which is capped at this multiplier.
pub const UNLIMITED_NBEST_FACTOR: usize = 1000;

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecoderSettings {
    pub search: SearchSettings,
    pub nbest: NBestSettings,
    pub scoring: ScoringSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchSettings {
    pub max_stack_size: usize,
    pub retain_arcs: bool,
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NBestSettings {
    pub size: usize,
    pub factor: usize,
    pub distinct: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoringSettings {
    pub context_width: usize,
}

impl DecoderSettings {
    /// Check every field that has a constrained range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        macro_rules! check_positive_usize {
            ($section:ident . $field:ident) => {
                if self.$section.$field == 0 {
                    return Err(SettingsError::InvalidValue {
                        field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                        reason: "must be positive".to_string(),
                    });
                }
            };
        }

        check_positive_usize!(search.max_stack_size);
        check_positive_usize!(search.threads);
        check_positive_usize!(nbest.size);

        // nbest.factor = 0 and scoring.context_width = 0 are both meaningful

        Ok(())
    }

    /// The iteration multiplier used by n-best extraction, with 0 resolved.
    pub fn effective_nbest_factor(&self) -> usize {
        resolve_nbest_factor(self.nbest.factor)
    }
}

impl Default for DecoderSettings {
    fn default() -> Self {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("default settings TOML must be valid")
    }
}

/// Map the "unlimited" factor (0) to [`UNLIMITED_NBEST_FACTOR`].
pub fn resolve_nbest_factor(factor: usize) -> usize {
    if factor == 0 {
        UNLIMITED_NBEST_FACTOR
    } else {
        factor
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<DecoderSettings, SettingsError> {
    let s: DecoderSettings =
        toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    s.validate()?;
    Ok(s)
}

/// Read and parse a settings file.
pub fn load_settings(path: &Path) -> Result<DecoderSettings, SettingsError> {
    let content = fs::read_to_string(path)?;
    parse_settings_toml(&content)
}
