//! Lazy k-best extraction over a filled chart.
//!
//! Starting from the best derivation, each popped path spawns its one-point
//! deviations into a bounded frontier, so the K best derivations come out in
//! order without enumerating the (exponential) full set.

mod frontier;
mod path;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use tracing::{debug, debug_span};

use crate::derivation::Derivation;
use crate::error::Result;
use crate::scoring::ScoreFunction;
use crate::search::Chart;
use crate::settings::resolve_nbest_factor;
use crate::span::Span;

pub use frontier::PathFrontier;
pub use path::DerivationPath;

use path::ChoiceSpace;

/// The derivation taking the top alternative at every choice point.
pub fn best_derivation(chart: &Chart, scorer: &dyn ScoreFunction) -> Result<Option<Derivation>> {
    let Some(full) = Span::full(chart.len()) else {
        return Ok(None);
    };
    let space = ChoiceSpace::new(chart, full)?;
    DerivationPath::pure(&space, scorer)?
        .map(|path| path.derivation(chart))
        .transpose()
}

/// Up to `count` best derivations of a filled chart, best first.
///
/// Search stops after `count * factor` pops (`factor` 0 = unlimited, see
/// [`resolve_nbest_factor`]). With `distinct`, paths whose output repeats an
/// earlier one are dropped, so fewer than `count` results can come back
/// even when more distinct outputs exist past the cap.
pub fn calc_nbest(
    chart: &Chart,
    scorer: &dyn ScoreFunction,
    count: usize,
    distinct: bool,
    factor: usize,
) -> Result<Vec<Derivation>> {
    Ok(nbest_paths(chart, scorer, count, distinct, factor)?
        .into_iter()
        .map(|(_, derivation)| derivation)
        .collect())
}

/// Like [`calc_nbest`], keeping the path behind each derivation.
pub fn nbest_paths(
    chart: &Chart,
    scorer: &dyn ScoreFunction,
    count: usize,
    distinct: bool,
    factor: usize,
) -> Result<Vec<(DerivationPath, Derivation)>> {
    let _span = debug_span!("calc_nbest", count, distinct, factor).entered();
    let Some(full) = Span::full(chart.len()) else {
        return Ok(Vec::new());
    };
    if count == 0 {
        return Ok(Vec::new());
    }

    let space = ChoiceSpace::new(chart, full)?;
    let Some(pure) = DerivationPath::pure(&space, scorer)? else {
        return Ok(Vec::new());
    };

    let limit = count.saturating_mul(resolve_nbest_factor(factor));
    let mut contenders = PathFrontier::new();
    contenders.push(pure);

    let mut results: Vec<(DerivationPath, Derivation)> = Vec::new();
    let mut outputs: HashSet<Vec<String>> = HashSet::new();
    let mut iteration = 0;
    while results.len() < count && iteration < limit {
        let Some(path) = contenders.pop() else {
            break;
        };
        iteration += 1;

        for deviant in path.deviations(&space, scorer)? {
            contenders.push(deviant);
        }

        let derivation = path.derivation(space.chart())?;
        if distinct {
            if outputs.insert(derivation.words.clone()) {
                results.push((path, derivation));
            }
            if factor > 0 {
                contenders.prune(limit);
            }
        } else {
            results.push((path, derivation));
            contenders.prune(count);
        }
    }

    debug!(
        result_count = results.len(),
        iterations = iteration,
        frontier = contenders.len(),
        best_score = results.first().map(|(p, _)| p.score())
    );
    Ok(results)
}
