mod extraction;

use crate::rules::{RuleTable, TargetSymbol};
use crate::scoring::{AdditiveScore, ScoreFunction};
use crate::search::testutil::{binary, lex, tokens};
use crate::search::{decode, Chart, HypId, Manager, SentenceContext};
use crate::settings::DecoderSettings;
use crate::span::Span;

static SCORER: AdditiveScore = AdditiveScore::new(2);

fn run<'a>(table: &'a RuleTable, settings: &'a DecoderSettings, source: &str) -> Manager<'a> {
    decode(SentenceContext::new(table, &SCORER, settings), tokens(source)).unwrap()
}

/// Two tokens with six derivations but only two outputs ("a b", "a c").
///
/// Both "a" rules recombine, as do both "b" rules; `c_score` places the "a c"
/// derivations relative to the duplicated "a b" ones.
fn two_output_table(c_score: f64) -> RuleTable {
    let mut table = RuleTable::new();
    let first = Span::new(0, 0);
    let second = Span::new(1, 1);
    table.insert(first, lex(first, &["a"], 0.0));
    table.insert(first, lex(first, &["a"], -1.0));
    table.insert(second, lex(second, &["b"], 0.0));
    table.insert(second, lex(second, &["b"], -1.0));
    table.insert(second, lex(second, &["c"], c_score));
    table.insert(Span::new(0, 1), binary(first, second, 0.0, false));
    table
}

/// Every derivation reachable from the full-sentence cell, by brute force:
/// each root alternative, and at every slot the live child or any of its arcs.
fn enumerate_all(chart: &Chart, scorer: &dyn ScoreFunction) -> Vec<(f64, Vec<String>)> {
    let Some(full) = Span::full(chart.len()) else {
        return Vec::new();
    };
    chart
        .cell(full)
        .unwrap()
        .ranked()
        .into_iter()
        .flat_map(|root| enumerate_from(chart, scorer, root))
        .collect()
}

fn enumerate_from(chart: &Chart, scorer: &dyn ScoreFunction, id: HypId) -> Vec<(f64, Vec<String>)> {
    let hyp = chart.hypothesis(id).unwrap();
    let rule = chart.rule(id).unwrap();

    let per_slot: Vec<Vec<(f64, Vec<String>)>> = hyp
        .children()
        .iter()
        .map(|&child| {
            let arcs = chart.hypothesis(child).unwrap().arcs().to_vec();
            std::iter::once(child)
                .chain(arcs)
                .flat_map(|alt| enumerate_from(chart, scorer, alt))
                .collect()
        })
        .collect();

    // Cartesian product over slots.
    let mut combos: Vec<Vec<&(f64, Vec<String>)>> = vec![Vec::new()];
    for options in &per_slot {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |option| {
                    let mut next = prefix.clone();
                    next.push(option);
                    next
                })
            })
            .collect();
    }

    combos
        .into_iter()
        .map(|combo| {
            let scores: Vec<f64> = combo.iter().map(|(s, _)| *s).collect();
            let mut words = Vec::new();
            for symbol in &rule.target {
                match symbol {
                    TargetSymbol::Terminal(w) => words.push(w.clone()),
                    TargetSymbol::NonTerminal(n) => words.extend(combo[*n].1.iter().cloned()),
                }
            }
            (scorer.combine(rule, &scores), words)
        })
        .collect()
}

fn sorted_scores(all: &[(f64, Vec<String>)]) -> Vec<f64> {
    let mut scores: Vec<f64> = all.iter().map(|(s, _)| *s).collect();
    scores.sort_by(|a, b| b.total_cmp(a));
    scores
}
