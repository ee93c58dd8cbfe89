use std::cmp::Ordering;
use std::collections::HashMap;
use std::iter;

use crate::error::Result;
use crate::rules::RuleApplication;
use crate::scoring::ScoreFunction;
use crate::span::Span;

use super::chart::Chart;
use super::hypothesis::{recombination_state, HypId, Hypothesis, RecombinationState};

/// Counters for one cell, summed into the sentence's `DecodeStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellStats {
    /// Candidates constructed
    pub built: usize,
    /// Candidates that met an existing hypothesis with the same state
    pub recombined: usize,
    /// Recombination losers dropped because arcs are not retained
    pub discarded: usize,
    /// Recombination losers kept as arcs. Arcs a loser already had move to
    /// the winner and are not counted again.
    pub arcs: usize,
    /// Live hypotheses removed by stack pruning
    pub pruned: usize,
}

/// All hypotheses covering one span.
///
/// The cell is the arena for its hypotheses: they are never removed, only
/// unlinked, so `HypId`s held by parents and by n-best paths stay valid for
/// the whole sentence.
#[derive(Debug, Clone)]
pub struct Cell {
    span: Span,
    rules: Vec<RuleApplication>,
    hypotheses: Vec<Hypothesis>,
    /// Indices of live hypotheses (one per state group)
    live: Vec<u32>,
    groups: HashMap<RecombinationState, u32>,
    stats: CellStats,
}

impl Cell {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            rules: Vec::new(),
            hypotheses: Vec::new(),
            live: Vec::new(),
            groups: HashMap::new(),
            stats: CellStats::default(),
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Number of live hypotheses.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// The top live hypothesis. Only meaningful after `sort`.
    pub fn best(&self) -> Option<&Hypothesis> {
        self.live.first().map(|&i| &self.hypotheses[i as usize])
    }

    /// Live hypotheses, best first once sorted.
    pub fn live(&self) -> impl Iterator<Item = &Hypothesis> + '_ {
        self.live.iter().map(|&i| &self.hypotheses[i as usize])
    }

    pub fn get(&self, index: u32) -> Option<&Hypothesis> {
        self.hypotheses.get(index as usize)
    }

    pub fn rule(&self, index: u32) -> Option<&RuleApplication> {
        self.rules.get(index as usize)
    }

    pub fn stats(&self) -> CellStats {
        self.stats
    }

    /// Every reachable hypothesis (live ones and their arcs), best first.
    pub fn ranked(&self) -> Vec<HypId> {
        let mut all: Vec<&Hypothesis> = self
            .live()
            .flat_map(|h| {
                iter::once(h).chain(h.arcs.iter().map(|a| &self.hypotheses[a.index as usize]))
            })
            .collect();
        all.sort_by(|a, b| by_score(a, b));
        all.into_iter().map(|h| h.id).collect()
    }

    /// Build hypotheses for every rule and every combination of live child
    /// hypotheses whose labels match the rule's slots.
    ///
    /// Child cells must already be in `chart`. Candidates are recombined as
    /// they are built; call `prune` and `sort` afterwards.
    pub fn build(
        &mut self,
        rules: Vec<RuleApplication>,
        chart: &Chart,
        scorer: &dyn ScoreFunction,
        retain_arcs: bool,
    ) -> Result<()> {
        let k = scorer.context_width();
        for rule in rules {
            rule.validate(self.span)?;

            let mut options: Vec<Vec<&Hypothesis>> = Vec::with_capacity(rule.arity());
            for slot in &rule.slots {
                let child_cell = chart.cell(slot.span)?;
                options.push(child_cell.live().filter(|h| h.lhs() == slot.label).collect());
            }
            if options.iter().any(Vec::is_empty) {
                continue;
            }

            let rule_index = self.rules.len() as u32;
            let mut choice = vec![0usize; options.len()];
            loop {
                let children: Vec<&Hypothesis> = choice
                    .iter()
                    .zip(&options)
                    .map(|(&c, opts)| opts[c])
                    .collect();
                let child_scores: Vec<f64> = children.iter().map(|h| h.score).collect();
                let score = scorer.combine(&rule, &child_scores);
                let (state, output_len) = recombination_state(&rule, &children, k);
                self.add(
                    Hypothesis {
                        id: HypId {
                            span: self.span,
                            index: 0,
                        },
                        rule: rule_index,
                        children: children.iter().map(|h| h.id).collect(),
                        score,
                        state,
                        output_len,
                        arcs: Vec::new(),
                    },
                    retain_arcs,
                );
                if !advance(&mut choice, &options) {
                    break;
                }
            }
            self.rules.push(rule);
        }
        Ok(())
    }

    /// Insert a candidate into its state group.
    ///
    /// The better of the candidate and the group's live hypothesis stays
    /// live; on a tie the earlier one does. The other becomes an arc of the
    /// winner together with any arcs it already had.
    fn add(&mut self, mut hyp: Hypothesis, retain_arcs: bool) {
        self.stats.built += 1;
        let Some(existing) = self.groups.get(&hyp.state).copied() else {
            let state = hyp.state.clone();
            let index = self.push(hyp);
            self.groups.insert(state, index);
            self.live.push(index);
            return;
        };

        self.stats.recombined += 1;
        if hyp.score > self.hypotheses[existing as usize].score {
            if retain_arcs {
                let loser = &mut self.hypotheses[existing as usize];
                let mut arcs = std::mem::take(&mut loser.arcs);
                arcs.push(loser.id);
                hyp.arcs = arcs;
                self.stats.arcs += 1;
            } else {
                self.stats.discarded += 1;
            }
            let state = hyp.state.clone();
            let index = self.push(hyp);
            self.groups.insert(state, index);
            if let Some(slot) = self.live.iter_mut().find(|i| **i == existing) {
                *slot = index;
            }
        } else if retain_arcs {
            let index = self.push(hyp);
            let id = self.hypotheses[index as usize].id;
            self.hypotheses[existing as usize].arcs.push(id);
            self.stats.arcs += 1;
        } else {
            self.stats.discarded += 1;
        }
    }

    fn push(&mut self, mut hyp: Hypothesis) -> u32 {
        let index = self.hypotheses.len() as u32;
        hyp.id = HypId {
            span: self.span,
            index,
        };
        self.hypotheses.push(hyp);
        index
    }

    /// Keep the `max_stack_size` best live hypotheses (earlier built wins
    /// ties). Dropped hypotheses and their arcs can no longer be reached.
    pub fn prune(&mut self, max_stack_size: usize) {
        if self.live.len() <= max_stack_size {
            return;
        }
        self.sort_live();
        let removed: Vec<u32> = self.live.drain(max_stack_size..).collect();
        self.stats.pruned += removed.len();
        for index in removed {
            self.groups.remove(&self.hypotheses[index as usize].state);
        }
    }

    /// Order live hypotheses and each arc list by descending score.
    pub fn sort(&mut self) {
        self.sort_live();
        for i in 0..self.live.len() {
            let index = self.live[i] as usize;
            let mut arcs = std::mem::take(&mut self.hypotheses[index].arcs);
            let hyps = &self.hypotheses;
            arcs.sort_by(|a, b| by_score(&hyps[a.index as usize], &hyps[b.index as usize]));
            self.hypotheses[index].arcs = arcs;
        }
    }

    fn sort_live(&mut self) {
        let hyps = &self.hypotheses;
        self.live
            .sort_by(|&a, &b| by_score(&hyps[a as usize], &hyps[b as usize]));
    }
}

/// Descending score, then construction order.
fn by_score(a: &Hypothesis, b: &Hypothesis) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.id.index.cmp(&b.id.index))
}

/// Step an odometer over child choices, last slot fastest.
fn advance(choice: &mut [usize], options: &[Vec<&Hypothesis>]) -> bool {
    for (c, opts) in choice.iter_mut().zip(options).rev() {
        *c += 1;
        if *c < opts.len() {
            return true;
        }
        *c = 0;
    }
    false
}
