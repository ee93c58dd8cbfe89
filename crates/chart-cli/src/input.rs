//! JSON decode requests: sentences, each with the rules that apply to it.
//!
//! ```json
//! {
//!   "sentences": [
//!     {
//!       "tokens": ["le", "chat"],
//!       "rules": [
//!         { "span": [0, 0], "target": [{"terminal": "the"}], "score": -0.5,
//!           "alignment": [[0, 0]] },
//!         ...
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use chart_core::{BatchInput, RuleTable};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    pub sentences: Vec<SentenceInput>,
}

#[derive(Debug, Deserialize)]
pub struct SentenceInput {
    pub tokens: Vec<String>,
    #[serde(flatten)]
    pub rules: RuleTable,
}

impl DecodeRequest {
    /// Borrowed views for [`chart_core::decode_batch`].
    pub fn batch_inputs(&self) -> Vec<BatchInput<'_>> {
        self.sentences
            .iter()
            .map(|s| BatchInput {
                tokens: &s.tokens,
                rules: &s.rules,
            })
            .collect()
    }
}

pub fn parse_request(json: &str) -> Result<DecodeRequest, InputError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_request(path: &Path) -> Result<DecodeRequest, InputError> {
    let content = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_request(&content)
}
