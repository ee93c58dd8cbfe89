use std::collections::BTreeSet;

use crate::derivation::Derivation;
use crate::error::{DecodeError, Result};
use crate::rules::TargetSymbol;
use crate::scoring::ScoreFunction;
use crate::search::{Chart, HypId};
use crate::span::Span;

/// The alternatives available at every choice point of one sentence.
///
/// At the root these are all hypotheses of the full-sentence cell; below the
/// root they are the live child a parent was built from followed by that
/// child's arcs.
pub(crate) struct ChoiceSpace<'c> {
    chart: &'c Chart,
    roots: Vec<HypId>,
}

impl<'c> ChoiceSpace<'c> {
    pub fn new(chart: &'c Chart, full: Span) -> Result<Self> {
        Ok(Self {
            chart,
            roots: chart.cell(full)?.ranked(),
        })
    }

    pub fn chart(&self) -> &'c Chart {
        self.chart
    }

    fn alternative(&self, is_root: bool, head: HypId, rank: u32) -> Result<Option<HypId>> {
        if is_root {
            return Ok(self.roots.get(rank as usize).copied());
        }
        if rank == 0 {
            return Ok(Some(head));
        }
        let arcs = self.chart.hypothesis(head)?.arcs();
        Ok(arcs.get(rank as usize - 1).copied())
    }
}

/// One node of a derivation: which alternative was taken where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChoicePoint {
    /// The rank-0 alternative at this point
    head: HypId,
    /// The hypothesis actually chosen
    hyp: HypId,
    rank: u32,
    /// One past the last point of this subtree (pre-order)
    end: u32,
}

/// A complete derivation, stored as its choice points in pre-order.
///
/// The children of a point follow it in slot order, each followed by its own
/// subtree, so the path is plain data that can be copied and edited without
/// touching the chart.
#[derive(Debug, Clone)]
pub struct DerivationPath {
    points: Vec<ChoicePoint>,
    score: f64,
}

impl DerivationPath {
    /// The path taking the best alternative everywhere, if the root has any.
    pub(crate) fn pure(space: &ChoiceSpace<'_>, scorer: &dyn ScoreFunction) -> Result<Option<Self>> {
        let Some(&root) = space.roots.first() else {
            return Ok(None);
        };
        let mut points = Vec::new();
        push_pure(space.chart, root, 0, root, &mut points)?;
        let score = score_subtree(space.chart, scorer, &points, 0)?;
        Ok(Some(Self { points, score }))
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Number of choice points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The hypothesis chosen at the root.
    pub fn root(&self) -> Option<HypId> {
        self.points.first().map(|p| p.hyp)
    }

    /// True when every choice point takes its top alternative.
    pub fn is_pure(&self) -> bool {
        self.points.iter().all(|p| p.rank == 0)
    }

    /// `(span, rank)` per choice point. Two paths over the same chart denote
    /// the same derivation exactly when their keys are equal.
    pub fn key(&self) -> Vec<(Span, u32)> {
        self.points.iter().map(|p| (p.hyp.span, p.rank)).collect()
    }

    /// The path differing from this one only at point `at`, which moves to
    /// its next-ranked alternative with a pure subtree below it.
    pub(crate) fn deviate(
        &self,
        space: &ChoiceSpace<'_>,
        scorer: &dyn ScoreFunction,
        at: usize,
    ) -> Result<Option<Self>> {
        let point = self.points[at];
        let rank = point.rank + 1;
        let Some(replacement) = space.alternative(at == 0, point.head, rank)? else {
            return Ok(None);
        };

        let old_end = point.end as usize;
        let mut points = Vec::with_capacity(self.points.len());
        points.extend_from_slice(&self.points[..at]);
        push_pure(space.chart, point.head, rank, replacement, &mut points)?;
        let new_end = points.len();

        // Ancestors of `at` are the earlier points whose subtree reaches past it.
        for p in &mut points[..at] {
            if p.end as usize >= old_end {
                p.end = (p.end as usize - old_end + new_end) as u32;
            }
        }
        points.extend(self.points[old_end..].iter().map(|p| ChoicePoint {
            end: (p.end as usize - old_end + new_end) as u32,
            ..*p
        }));

        let score = score_subtree(space.chart, scorer, &points, 0)?;
        Ok(Some(Self { points, score }))
    }

    /// Every path differing from this one at exactly one choice point.
    pub(crate) fn deviations(
        &self,
        space: &ChoiceSpace<'_>,
        scorer: &dyn ScoreFunction,
    ) -> Result<Vec<Self>> {
        let mut out = Vec::new();
        for at in 0..self.points.len() {
            if let Some(path) = self.deviate(space, scorer, at)? {
                out.push(path);
            }
        }
        Ok(out)
    }

    /// Output words and alignment of this path.
    pub fn derivation(&self, chart: &Chart) -> Result<Derivation> {
        let mut words = Vec::new();
        let mut alignment = BTreeSet::new();
        if !self.points.is_empty() {
            self.emit(chart, 0, &mut words, &mut alignment)?;
        }
        Ok(Derivation {
            words,
            score: self.score,
            alignment,
        })
    }

    fn emit(
        &self,
        chart: &Chart,
        at: usize,
        words: &mut Vec<String>,
        alignment: &mut BTreeSet<(usize, usize)>,
    ) -> Result<()> {
        let point = self.points[at];
        let span = point.hyp.span;
        let rule = chart.rule(point.hyp)?;
        let children = child_points(&self.points, at);

        // Output position of each terminal, by index into the rule's target.
        let mut positions: Vec<Option<usize>> = vec![None; rule.target.len()];
        for (t, symbol) in rule.target.iter().enumerate() {
            match symbol {
                TargetSymbol::Terminal(word) => {
                    positions[t] = Some(words.len());
                    words.push(word.clone());
                }
                TargetSymbol::NonTerminal(n) => {
                    let &child = children.get(*n).ok_or_else(|| DecodeError::InvalidTarget {
                        span,
                        reason: format!("non-terminal {n} has no child in the derivation"),
                    })?;
                    self.emit(chart, child, words, alignment)?;
                }
            }
        }

        for &(source_pos, target_index) in &rule.alignment {
            let located = positions.get(target_index).copied().flatten();
            match located {
                Some(out) if span.contains(source_pos) => {
                    alignment.insert((source_pos, out));
                }
                _ => {
                    return Err(DecodeError::MissingAlignment {
                        span,
                        source_pos,
                        target_index,
                    })
                }
            }
        }
        Ok(())
    }
}

/// Append the pure subtree rooted at `chosen` (taken at `rank` of `head`).
fn push_pure(
    chart: &Chart,
    head: HypId,
    rank: u32,
    chosen: HypId,
    out: &mut Vec<ChoicePoint>,
) -> Result<()> {
    let at = out.len();
    out.push(ChoicePoint {
        head,
        hyp: chosen,
        rank,
        end: 0,
    });
    for &child in chart.hypothesis(chosen)?.children() {
        push_pure(chart, child, 0, child, out)?;
    }
    out[at].end = out.len() as u32;
    Ok(())
}

/// Indices of the direct children of point `at`, in slot order.
fn child_points(points: &[ChoicePoint], at: usize) -> Vec<usize> {
    let end = points[at].end as usize;
    let mut children = Vec::new();
    let mut c = at + 1;
    while c < end {
        children.push(c);
        c = points[c].end as usize;
    }
    children
}

/// Rescore the subtree at `at` bottom-up with the chosen hypotheses' rules.
fn score_subtree(
    chart: &Chart,
    scorer: &dyn ScoreFunction,
    points: &[ChoicePoint],
    at: usize,
) -> Result<f64> {
    let child_scores = child_points(points, at)
        .into_iter()
        .map(|c| score_subtree(chart, scorer, points, c))
        .collect::<Result<Vec<f64>>>()?;
    Ok(scorer.combine(chart.rule(points[at].hyp)?, &child_scores))
}
