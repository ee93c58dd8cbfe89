//! Rule applications and the source that supplies them per span.
//!
//! Grammar lookup itself lives outside this crate. The chart only needs, for
//! each span, the synchronous rules whose source side matches it, already
//! scored and with their non-terminal slots resolved to concrete sub-spans.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};
use crate::span::Span;

/// Label used when a rule or slot does not name one.
pub const DEFAULT_LABEL: &str = "X";

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

/// One symbol on the target side of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSymbol {
    /// An output word
    Terminal(String),
    /// The output of the child filling slot `n` (index into `RuleApplication::slots`)
    NonTerminal(usize),
}

/// A non-terminal gap in a rule's source side, bound to a sub-span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub span: Span,
    /// Left-hand-side label a child hypothesis must carry to fill this slot
    #[serde(default = "default_label")]
    pub label: String,
}

impl Slot {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            label: default_label(),
        }
    }

    pub fn labeled(span: Span, label: &str) -> Self {
        Self {
            span,
            label: label.to_string(),
        }
    }
}

/// A scored synchronous rule matched against one span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleApplication {
    #[serde(default = "default_label")]
    pub lhs: String,
    pub target: Vec<TargetSymbol>,
    /// Slots in source order, pairwise disjoint
    #[serde(default)]
    pub slots: Vec<Slot>,
    /// Precomputed rule score (higher = better)
    pub score: f64,
    /// (absolute source position, index into `target`) for aligned terminals
    #[serde(default)]
    pub alignment: Vec<(usize, usize)>,
}

impl RuleApplication {
    /// A rule with no slots producing `words`.
    pub fn lexical<S: AsRef<str>>(words: &[S], score: f64) -> Self {
        Self {
            lhs: default_label(),
            target: words
                .iter()
                .map(|w| TargetSymbol::Terminal(w.as_ref().to_string()))
                .collect(),
            slots: Vec::new(),
            score,
            alignment: Vec::new(),
        }
    }

    pub fn with_lhs(mut self, lhs: &str) -> Self {
        self.lhs = lhs.to_string();
        self
    }

    pub fn with_alignment(mut self, alignment: Vec<(usize, usize)>) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// Check that this rule is usable on `span`.
    ///
    /// Slots must sit strictly inside the span (so CYK+ order guarantees they
    /// are filled first) and every slot must appear exactly once on the
    /// target side.
    pub(crate) fn validate(&self, span: Span) -> Result<()> {
        for slot in &self.slots {
            if !span.covers(&slot.span) {
                return Err(DecodeError::InvalidSlot {
                    span,
                    slot: slot.span,
                    reason: "slot lies outside the rule span",
                });
            }
            if slot.span.width() >= span.width() {
                return Err(DecodeError::InvalidSlot {
                    span,
                    slot: slot.span,
                    reason: "slot is not narrower than the rule span",
                });
            }
        }

        for pair in self.slots.windows(2) {
            if pair[1].span.start <= pair[0].span.end {
                return Err(DecodeError::InvalidSlot {
                    span,
                    slot: pair[1].span,
                    reason: "slots overlap or are out of source order",
                });
            }
        }
        let mut uses = vec![0usize; self.slots.len()];
        for symbol in &self.target {
            if let TargetSymbol::NonTerminal(n) = *symbol {
                match uses.get_mut(n) {
                    Some(count) => *count += 1,
                    None => {
                        return Err(DecodeError::InvalidTarget {
                            span,
                            reason: format!(
                                "non-terminal {n} refers past {} slots",
                                self.slots.len()
                            ),
                        })
                    }
                }
            }
        }
        if let Some(n) = uses.iter().position(|&count| count != 1) {
            return Err(DecodeError::InvalidTarget {
                span,
                reason: format!("slot {n} is used {} times on the target side", uses[n]),
            });
        }
        Ok(())
    }
}

/// Supplies the candidate rule applications for a span.
///
/// Implementations are shared read-only by every sentence decoded with them,
/// possibly from several threads at once.
pub trait RuleApplicationSource: Send + Sync {
    fn applicable_rules(&self, span: Span) -> Vec<RuleApplication>;
}

/// An in-memory rule source keyed by span.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RuleTableFile")]
pub struct RuleTable {
    rules: HashMap<Span, Vec<RuleApplication>>,
}

#[derive(Deserialize)]
struct RuleTableFile {
    rules: Vec<SpanRule>,
}

#[derive(Deserialize)]
struct SpanRule {
    span: Span,
    #[serde(flatten)]
    rule: RuleApplication,
}

impl From<RuleTableFile> for RuleTable {
    fn from(file: RuleTableFile) -> Self {
        let mut table = RuleTable::new();
        for entry in file.rules {
            table.insert(entry.span, entry.rule);
        }
        table
    }
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for one span keep insertion order.
    pub fn insert(&mut self, span: Span, rule: RuleApplication) {
        self.rules.entry(span).or_default().push(rule);
    }

    /// Number of rules across all spans.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.values().all(Vec::is_empty)
    }
}

impl RuleApplicationSource for RuleTable {
    fn applicable_rules(&self, span: Span) -> Vec<RuleApplication> {
        self.rules.get(&span).cloned().unwrap_or_default()
    }
}
