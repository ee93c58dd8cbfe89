use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// A complete translation of one sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Derivation {
    /// Output tokens
    pub words: Vec<String>,
    pub score: f64,
    /// (source position, output position) pairs
    pub alignment: BTreeSet<(usize, usize)>,
}

impl Derivation {
    /// Output tokens joined by single spaces.
    pub fn output(&self) -> String {
        self.words.join(" ")
    }

    /// Alignment as `src-tgt` pairs separated by spaces, e.g. `0-0 1-2`.
    pub fn alignment_string(&self) -> String {
        self.alignment
            .iter()
            .map(|(s, t)| format!("{s}-{t}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ||| {} ||| {}",
            self.output(),
            self.score,
            self.alignment_string()
        )
    }
}
