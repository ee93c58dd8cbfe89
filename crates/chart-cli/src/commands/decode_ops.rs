use std::path::Path;

use chart_core::{decode_batch, AdditiveScore, DecoderSettings, Derivation};
use serde::Serialize;
use tracing::{info, warn};

use crate::input::{load_request, DecodeRequest};

use super::config_ops::resolve_settings;

/// Command-line overrides on top of the loaded settings.
#[derive(Debug, Default, Clone)]
pub struct DecodeOptions {
    /// Derivations per sentence (`nbest.size` if unset)
    pub nbest: Option<usize>,
    pub distinct: Option<bool>,
    /// Per-sentence cell workers (`search.threads` if unset)
    pub threads: Option<usize>,
    /// Sentences decoded concurrently
    pub jobs: usize,
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct SentenceReport {
    pub sentence: usize,
    pub derivations: Vec<Derivation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Decode every sentence of `request` and collect one report per sentence,
/// in input order. A sentence that fails is reported with its error and no
/// derivations.
pub fn run_decode(
    request: &DecodeRequest,
    settings: &DecoderSettings,
    count: usize,
    distinct: bool,
    jobs: usize,
) -> Vec<SentenceReport> {
    let scorer = AdditiveScore::new(settings.scoring.context_width);
    let inputs = request.batch_inputs();
    let results = decode_batch(&inputs, &scorer, settings, jobs, |manager| {
        if count == 1 {
            Ok(manager.best_derivation()?.into_iter().collect())
        } else {
            manager.calc_nbest(count, distinct)
        }
    });

    results
        .into_iter()
        .enumerate()
        .map(|(sentence, result)| match result {
            Ok(derivations) => SentenceReport {
                sentence,
                derivations,
                error: None,
            },
            Err(e) => {
                warn!(sentence, error = %e, "sentence failed");
                SentenceReport {
                    sentence,
                    derivations: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

/// `sentence ||| output ||| score ||| alignment`, one line per derivation.
pub fn format_text(reports: &[SentenceReport]) -> String {
    let mut out = String::new();
    for report in reports {
        for derivation in &report.derivations {
            out.push_str(&format!("{} ||| {}\n", report.sentence, derivation));
        }
    }
    out
}

/// Returns false if any sentence failed; those are listed on stderr.
pub fn decode_cmd(input: &str, config: Option<&str>, opts: &DecodeOptions) -> bool {
    let mut settings = die!(resolve_settings(config), "Error loading settings: {}");
    if let Some(threads) = opts.threads {
        settings.search.threads = threads;
        die!(settings.validate(), "Error: {}");
    }
    let request = die!(load_request(Path::new(input)), "Error: {}");

    let count = opts.nbest.unwrap_or(settings.nbest.size);
    let distinct = opts.distinct.unwrap_or(settings.nbest.distinct);
    info!(
        sentences = request.sentences.len(),
        count,
        distinct,
        jobs = opts.jobs,
        "decoding"
    );

    let reports = run_decode(&request, &settings, count, distinct, opts.jobs);
    if opts.json {
        for report in &reports {
            println!(
                "{}",
                die!(serde_json::to_string(report), "JSON serialization failed: {}")
            );
        }
    } else {
        print!("{}", format_text(&reports));
    }

    let mut ok = true;
    for report in &reports {
        if let Some(error) = &report.error {
            eprintln!("sentence {}: {}", report.sentence, error);
            ok = false;
        }
    }
    ok
}
