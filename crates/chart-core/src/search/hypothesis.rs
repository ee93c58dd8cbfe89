use std::fmt;

use crate::rules::{RuleApplication, TargetSymbol};
use crate::span::Span;

/// Stable handle to a hypothesis: the span of its cell plus its position in
/// that cell's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HypId {
    pub span: Span,
    pub index: u32,
}

impl fmt::Display for HypId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.span, self.index)
    }
}

/// What a parent can observe about a hypothesis. Hypotheses in one cell with
/// equal states are interchangeable for building larger spans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecombinationState {
    pub lhs: String,
    /// First `k` output words (the whole output when shorter)
    pub left: Vec<String>,
    /// Last `k` output words (the whole output when shorter)
    pub right: Vec<String>,
}

/// One scored derivation state for a span.
///
/// Never mutated after it leaves cell construction, except for its arc list
/// while the owning cell is still being built.
#[derive(Debug, Clone)]
pub struct Hypothesis {
    pub(crate) id: HypId,
    /// Index into the owning cell's rules
    pub(crate) rule: u32,
    /// One per rule slot, in slot order
    pub(crate) children: Vec<HypId>,
    pub(crate) score: f64,
    pub(crate) state: RecombinationState,
    pub(crate) output_len: usize,
    /// Recombined alternatives with the same state, best first once sorted
    pub(crate) arcs: Vec<HypId>,
}

impl Hypothesis {
    pub fn id(&self) -> HypId {
        self.id
    }

    pub fn span(&self) -> Span {
        self.id.span
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn children(&self) -> &[HypId] {
        &self.children
    }

    pub fn arcs(&self) -> &[HypId] {
        &self.arcs
    }

    pub fn lhs(&self) -> &str {
        &self.state.lhs
    }

    pub fn state(&self) -> &RecombinationState {
        &self.state
    }

    /// Number of target words this hypothesis produces.
    pub fn output_len(&self) -> usize {
        self.output_len
    }
}

/// Boundary words and output length of `rule` applied to `children`.
///
/// Works from the children's boundaries alone: a child shorter than `k`
/// contributes its whole output, a longer one saturates the boundary.
pub(crate) fn recombination_state(
    rule: &RuleApplication,
    children: &[&Hypothesis],
    k: usize,
) -> (RecombinationState, usize) {
    let mut left: Vec<String> = Vec::with_capacity(k);
    let mut output_len = 0;
    for symbol in &rule.target {
        match symbol {
            TargetSymbol::Terminal(word) => {
                output_len += 1;
                if left.len() < k {
                    left.push(word.clone());
                }
            }
            TargetSymbol::NonTerminal(n) => {
                let child = children[*n];
                output_len += child.output_len;
                let room = k - left.len();
                left.extend(child.state.left.iter().take(room).cloned());
            }
        }
    }

    // Walk backwards, collecting the suffix in reverse.
    let mut right: Vec<String> = Vec::with_capacity(k);
    for symbol in rule.target.iter().rev() {
        if right.len() == k {
            break;
        }
        match symbol {
            TargetSymbol::Terminal(word) => right.push(word.clone()),
            TargetSymbol::NonTerminal(n) => {
                let room = k - right.len();
                right.extend(children[*n].state.right.iter().rev().take(room).cloned());
            }
        }
    }
    right.reverse();

    let state = RecombinationState {
        lhs: rule.lhs.clone(),
        left,
        right,
    };
    (state, output_len)
}
