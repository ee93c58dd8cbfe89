//! Hand-built grammars shared by the search and n-best tests.

use crate::rules::{RuleApplication, RuleApplicationSource, RuleTable, Slot, TargetSymbol};
use crate::settings::DecoderSettings;
use crate::span::Span;

pub fn tokens(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// A rule with no slots over `span`, aligning source and target word by word.
pub fn lex(span: Span, words: &[&str], score: f64) -> RuleApplication {
    let aligned = span.width().min(words.len());
    RuleApplication::lexical(words, score)
        .with_alignment((0..aligned).map(|i| (span.start + i, i)).collect())
}

/// `X -> X1 X2` (monotone) or `X -> X2 X1` (inverted) over two sub-spans.
pub fn binary(left: Span, right: Span, score: f64, inverted: bool) -> RuleApplication {
    let target = if inverted {
        vec![TargetSymbol::NonTerminal(1), TargetSymbol::NonTerminal(0)]
    } else {
        vec![TargetSymbol::NonTerminal(0), TargetSymbol::NonTerminal(1)]
    };
    RuleApplication {
        lhs: "X".to_string(),
        target,
        slots: vec![Slot::new(left), Slot::new(right)],
        score,
        alignment: Vec::new(),
    }
}

/// Every token translates to its uppercase form (score -1), and every span
/// of width >= 2 has a monotone binary rule (score 0) at every split point.
pub fn chain_grammar(source: &[String]) -> RuleTable {
    let mut table = RuleTable::new();
    let n = source.len();
    for (i, word) in source.iter().enumerate() {
        let upper = word.to_uppercase();
        table.insert(Span::new(i, i), lex(Span::new(i, i), &[upper.as_str()], -1.0));
    }
    for width in 2..=n {
        for start in 0..=n - width {
            let end = start + width - 1;
            for split in start..end {
                table.insert(
                    Span::new(start, end),
                    binary(Span::new(start, split), Span::new(split + 1, end), 0.0, false),
                );
            }
        }
    }
    table
}

/// Three tokens, unit rules scoring 1 each, one binary rule (score 0) per
/// width-2 span and one over the whole sentence.
pub fn three_token_table() -> RuleTable {
    let mut table = RuleTable::new();
    for (i, word) in ["le", "petit", "chat"].iter().enumerate() {
        let span = Span::new(i, i);
        table.insert(span, lex(span, &[*word], 1.0));
    }
    table.insert(
        Span::new(0, 1),
        binary(Span::new(0, 0), Span::new(1, 1), 0.0, false),
    );
    table.insert(
        Span::new(1, 2),
        binary(Span::new(1, 1), Span::new(2, 2), 0.0, false),
    );
    table.insert(
        Span::new(0, 2),
        binary(Span::new(0, 1), Span::new(2, 2), 0.0, false),
    );
    table
}

pub fn settings(max_stack_size: usize, retain_arcs: bool) -> DecoderSettings {
    let mut s = DecoderSettings::default();
    s.search.max_stack_size = max_stack_size;
    s.search.retain_arcs = retain_arcs;
    s
}

/// Serves `inner`, but panics when asked for any span in `panic_on`.
pub struct PanickingRules {
    pub inner: RuleTable,
    pub panic_on: Vec<Span>,
}

impl RuleApplicationSource for PanickingRules {
    fn applicable_rules(&self, span: Span) -> Vec<RuleApplication> {
        if self.panic_on.contains(&span) {
            panic!("rule lookup failed for {span}");
        }
        self.inner.applicable_rules(span)
    }
}
