use std::path::Path;

use chart_core::settings::{self, DecoderSettings};

pub fn settings_export() {
    print!("{}", settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let s = die!(settings::load_settings(Path::new(file)), "Error: {}");
    println!("{}", summary(&s));
}

/// One-line digest of the settings that shape a decode.
pub fn summary(s: &DecoderSettings) -> String {
    format!(
        "OK: search.max_stack_size={}, search.threads={}, nbest.size={}, nbest.factor={}, scoring.context_width={}",
        s.search.max_stack_size,
        s.search.threads,
        s.nbest.size,
        s.nbest.factor,
        s.scoring.context_width
    )
}

/// Settings from `config`, or the embedded defaults.
pub fn resolve_settings(config: Option<&str>) -> Result<DecoderSettings, settings::SettingsError> {
    match config {
        Some(path) => settings::load_settings(Path::new(path)),
        None => Ok(DecoderSettings::default()),
    }
}
