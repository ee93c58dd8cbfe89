use std::collections::HashSet;

use crate::error::DecodeError;
use crate::nbest::{calc_nbest, nbest_paths};
use crate::rules::RuleTable;
use crate::search::testutil::{binary, chain_grammar, lex, settings, three_token_table, tokens};
use crate::search::{Chart, Manager, SentenceContext};
use crate::settings::DecoderSettings;
use crate::span::Span;

use super::{run, two_output_table, SCORER};

#[test]
fn test_first_result_is_best_derivation() {
    let table = two_output_table(-0.5);
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "x y");

    let best = manager.best_derivation().unwrap().unwrap();
    let nbest = manager.calc_nbest(3, false).unwrap();
    assert_eq!(nbest[0], best);
    assert_eq!(best.output(), "a b");
    assert_eq!(best.score, 0.0);
}

#[test]
fn test_non_distinct_lists_duplicate_outputs() {
    let table = two_output_table(-0.5);
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "x y");

    let nbest = manager.calc_nbest(5, false).unwrap();
    let scores: Vec<f64> = nbest.iter().map(|d| d.score).collect();
    assert_eq!(scores, vec![0.0, -0.5, -1.0, -1.0, -1.5]);
    let outputs: Vec<String> = nbest.iter().map(|d| d.output()).collect();
    assert_eq!(outputs[0], "a b");
    assert_eq!(outputs[1], "a c");
    assert_eq!(outputs.iter().filter(|o| *o == "a b").count(), 3);
}

#[test]
fn test_distinct_returns_only_available_outputs() {
    let table = two_output_table(-0.5);
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "x y");

    let nbest = manager.calc_nbest(5, true).unwrap();
    let outputs: Vec<String> = nbest.iter().map(|d| d.output()).collect();
    assert_eq!(outputs, vec!["a b", "a c"]);
    assert_eq!(nbest[0].score, 0.0);
    assert_eq!(nbest[1].score, -0.5);
}

#[test]
fn test_distinct_keeps_best_score_per_output() {
    let table = two_output_table(-1.5);
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "x y");

    let nbest = manager.calc_nbest_with_factor(2, true, 0).unwrap();
    let summary: Vec<(String, f64)> = nbest.iter().map(|d| (d.output(), d.score)).collect();
    assert_eq!(
        summary,
        vec![("a b".to_string(), 0.0), ("a c".to_string(), -1.5)]
    );
}

#[test]
fn test_iteration_cap_can_starve_distinct_results() {
    // "a b" has derivations at 0, -1 and -1, all ahead of "a c" at -1.5.
    let table = two_output_table(-1.5);
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "x y");

    let capped = manager.calc_nbest_with_factor(2, true, 1).unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].output(), "a b");

    let roomier = manager.calc_nbest_with_factor(2, true, 2).unwrap();
    assert_eq!(roomier.len(), 2);

    let unlimited = manager.calc_nbest_with_factor(2, true, 0).unwrap();
    assert_eq!(unlimited, roomier);
}

#[test]
fn test_count_zero_and_empty_sentence() {
    let table = three_token_table();
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "le petit chat");
    assert!(manager.calc_nbest(0, false).unwrap().is_empty());
    assert!(manager.calc_nbest(0, true).unwrap().is_empty());

    let empty_table = RuleTable::new();
    let manager = run(&empty_table, &settings, "");
    assert!(manager.calc_nbest(10, false).unwrap().is_empty());
    assert!(manager.best_derivation().unwrap().is_none());
}

#[test]
fn test_no_derivation_yields_empty_list() {
    // No rule covers the full sentence.
    let source = tokens("x y");
    let mut table = RuleTable::new();
    let span = Span::new(0, 0);
    table.insert(span, lex(span, &["a"], 0.0));
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "x y");
    assert_eq!(manager.source(), source.as_slice());
    assert!(manager.calc_nbest(3, false).unwrap().is_empty());
    assert!(manager.best_derivation().unwrap().is_none());
}

#[test]
fn test_single_derivation_sentence() {
    let table = three_token_table();
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "le petit chat");

    let nbest = manager.calc_nbest(10, false).unwrap();
    assert_eq!(nbest.len(), 1);
    assert_eq!(nbest[0].output(), "le petit chat");
    assert_eq!(nbest[0].score, 3.0);
}

#[test]
fn test_spurious_ambiguity_collapses_under_distinct() {
    // Every bracketing of four tokens gives "A B C D" at -4.
    let source = tokens("a b c d");
    let table = chain_grammar(&source);
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "a b c d");

    let all = manager.calc_nbest_with_factor(20, false, 0).unwrap();
    // Catalan(3) bracketings.
    assert_eq!(all.len(), 5);
    assert!(all.iter().all(|d| d.output() == "A B C D" && d.score == -4.0));

    let distinct = manager.calc_nbest(20, true).unwrap();
    assert_eq!(distinct.len(), 1);
    assert_eq!(distinct[0].output(), "A B C D");
}

#[test]
fn test_without_arcs_only_live_derivations_remain() {
    let table = two_output_table(-0.5);
    let settings = settings(200, false);
    let manager = run(&table, &settings, "x y");

    let nbest = manager.calc_nbest(10, false).unwrap();
    let scores: Vec<f64> = nbest.iter().map(|d| d.score).collect();
    assert_eq!(scores, vec![0.0, -0.5]);
}

#[test]
fn test_paths_are_unique_and_ordered() {
    let table = two_output_table(-0.5);
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "x y");

    let paths = nbest_paths(manager.chart(), &SCORER, 10, false, 0).unwrap();
    assert_eq!(paths.len(), 6);
    assert!(paths[0].0.is_pure());
    assert!(paths[1..].iter().all(|(p, _)| !p.is_pure()));

    let keys: HashSet<_> = paths.iter().map(|(p, _)| p.key()).collect();
    assert_eq!(keys.len(), paths.len());
    assert!(paths.windows(2).all(|w| w[0].0.score() >= w[1].0.score()));
    for (path, derivation) in &paths {
        assert_eq!(path.score(), derivation.score);
        // Root plus one point per token.
        assert_eq!(path.len(), 3);
    }
}

#[test]
fn test_alignment_follows_output_positions() {
    let table = two_output_table(-0.5);
    let settings = DecoderSettings::default();
    let manager = run(&table, &settings, "x y");

    for derivation in manager.calc_nbest(6, false).unwrap() {
        assert_eq!(derivation.alignment_string(), "0-0 1-1");
    }
}

#[test]
fn test_nbest_requires_filled_chart() {
    let table = three_token_table();
    let settings = DecoderSettings::default();
    let ctx = SentenceContext::new(&table, &SCORER, &settings);
    let manager = Manager::new(ctx, tokens("le petit chat")).unwrap();

    assert!(matches!(
        manager.calc_nbest(3, false),
        Err(DecodeError::NotFilled(_))
    ));
    assert!(matches!(
        manager.best_derivation(),
        Err(DecodeError::NotFilled(_))
    ));
}

#[test]
fn test_free_function_on_unfilled_chart_reports_span() {
    let chart = Chart::new(2);
    let err = calc_nbest(&chart, &SCORER, 1, false, 0).unwrap_err();
    assert!(matches!(err, DecodeError::UnfilledSpan(_)));
}

#[test]
fn test_path_read_against_other_chart_reports_target() {
    let first = Span::new(0, 0);
    let second = Span::new(1, 1);
    let mut phrase = RuleTable::new();
    let mut split = RuleTable::new();
    for table in [&mut phrase, &mut split] {
        table.insert(first, lex(first, &["a"], 0.0));
        table.insert(second, lex(second, &["b"], 0.0));
    }
    phrase.insert(Span::new(0, 1), lex(Span::new(0, 1), &["ab"], 0.0));
    split.insert(Span::new(0, 1), binary(first, second, 0.0, false));

    let settings = DecoderSettings::default();
    let phrase_manager = run(&phrase, &settings, "x y");
    let split_manager = run(&split, &settings, "x y");

    // The phrase path has no children where the binary rule expects two.
    let paths = nbest_paths(phrase_manager.chart(), &SCORER, 1, false, 0).unwrap();
    assert_eq!(paths[0].1.output(), "ab");
    let err = paths[0].0.derivation(split_manager.chart()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::InvalidTarget { span, .. } if span == Span::new(0, 1)
    ));
}
