use std::panic::{self, AssertUnwindSafe};
use std::thread;

use tracing::{debug, debug_span};

use crate::derivation::Derivation;
use crate::error::{DecodeError, Result};
use crate::nbest;
use crate::rules::RuleApplicationSource;
use crate::scoring::ScoreFunction;
use crate::settings::DecoderSettings;
use crate::span::Span;

use super::cell::{Cell, CellStats};
use super::chart::Chart;
use super::hypothesis::Hypothesis;

/// Everything one sentence's decode reads. All of it is shared read-only, so
/// one context can serve many sentences decoded at the same time.
#[derive(Clone, Copy)]
pub struct SentenceContext<'a> {
    pub rules: &'a dyn RuleApplicationSource,
    pub scorer: &'a dyn ScoreFunction,
    pub settings: &'a DecoderSettings,
    /// Tags log output for this sentence
    pub sentence_id: usize,
}

impl<'a> SentenceContext<'a> {
    pub fn new(
        rules: &'a dyn RuleApplicationSource,
        scorer: &'a dyn ScoreFunction,
        settings: &'a DecoderSettings,
    ) -> Self {
        Self {
            rules,
            scorer,
            settings,
            sentence_id: 0,
        }
    }

    pub fn with_sentence_id(self, sentence_id: usize) -> Self {
        Self {
            sentence_id,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    NotStarted,
    Filling,
    Filled,
}

/// Search totals for one sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub cells: usize,
    pub hypotheses: usize,
    pub recombined: usize,
    pub discarded: usize,
    pub arcs: usize,
    pub pruned: usize,
}

impl DecodeStats {
    fn absorb(&mut self, cell: CellStats) {
        self.cells += 1;
        self.hypotheses += cell.built;
        self.recombined += cell.recombined;
        self.discarded += cell.discarded;
        self.arcs += cell.arcs;
        self.pruned += cell.pruned;
    }
}

/// Decodes one sentence: fills the chart bottom-up, then answers best and
/// n-best queries from it. Dropping the manager releases every hypothesis.
pub struct Manager<'a> {
    ctx: SentenceContext<'a>,
    source: Vec<String>,
    chart: Chart,
    state: ManagerState,
    stats: DecodeStats,
}

impl<'a> Manager<'a> {
    /// Rejects invalid settings before any work is done.
    pub fn new(ctx: SentenceContext<'a>, source: Vec<String>) -> Result<Self> {
        ctx.settings.validate()?;
        let chart = Chart::new(source.len());
        Ok(Self {
            ctx,
            source,
            chart,
            state: ManagerState::NotStarted,
            stats: DecodeStats::default(),
        })
    }

    pub fn source(&self) -> &[String] {
        &self.source
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Fill every cell, narrowest spans first.
    ///
    /// A cell depends only on strictly narrower cells, so all cells of one
    /// width can be built independently; with `search.threads > 1` they are
    /// built in parallel and joined before the next width starts.
    ///
    /// A panic in the rule source or scorer while a width is filled is
    /// caught and reported as [`DecodeError::WorkerPanicked`], whatever the
    /// thread count. The chart is left partially filled.
    pub fn process_sentence(&mut self) -> Result<()> {
        if self.state != ManagerState::NotStarted {
            return Err(DecodeError::AlreadyStarted(self.state));
        }
        let size = self.source.len();
        let _span = debug_span!("process_sentence", sentence_id = self.ctx.sentence_id, size)
            .entered();
        self.state = ManagerState::Filling;

        for width in 1..=size {
            self.fill_width(width)?;
        }

        self.state = ManagerState::Filled;
        debug!(
            cells = self.stats.cells,
            hypotheses = self.stats.hypotheses,
            recombined = self.stats.recombined,
            discarded = self.stats.discarded,
            arcs = self.stats.arcs,
            pruned = self.stats.pruned,
            best_score = self.chart_best().map(Hypothesis::score)
        );
        Ok(())
    }

    fn fill_width(&mut self, width: usize) -> Result<()> {
        let size = self.source.len();
        let spans: Vec<Span> = (0..=size - width)
            .map(|start| Span::new(start, start + width - 1))
            .collect();
        let threads = self.ctx.settings.search.threads.min(spans.len());

        let ctx = &self.ctx;
        let chart = &self.chart;
        let cells = if threads <= 1 {
            panic::catch_unwind(AssertUnwindSafe(|| {
                spans
                    .iter()
                    .map(|&span| build_cell(ctx, chart, span))
                    .collect::<Result<Vec<Cell>>>()
            }))
            .map_err(|_| DecodeError::WorkerPanicked(width))??
        } else {
            let chunk = spans.len().div_ceil(threads);
            thread::scope(|scope| {
                let workers: Vec<_> = spans
                    .chunks(chunk)
                    .map(|part| {
                        scope.spawn(move || {
                            part.iter()
                                .map(|&span| build_cell(ctx, chart, span))
                                .collect::<Result<Vec<Cell>>>()
                        })
                    })
                    .collect();
                // Every worker is joined before any failure is reported.
                let joined: Vec<_> = workers.into_iter().map(|w| w.join()).collect();
                let mut cells = Vec::with_capacity(spans.len());
                for built in joined {
                    cells.extend(built.map_err(|_| DecodeError::WorkerPanicked(width))??);
                }
                Ok::<_, DecodeError>(cells)
            })?
        };

        for cell in cells {
            #[cfg(feature = "trace")]
            tracing::trace!(span = %cell.span(), size = cell.len());
            self.stats.absorb(cell.stats());
            self.chart.insert(cell)?;
        }
        Ok(())
    }

    fn chart_best(&self) -> Option<&Hypothesis> {
        let full = Span::full(self.source.len())?;
        self.chart.cell(full).ok()?.best()
    }

    fn ensure_filled(&self) -> Result<()> {
        if self.state != ManagerState::Filled {
            return Err(DecodeError::NotFilled(self.state));
        }
        Ok(())
    }

    /// The top hypothesis covering the whole sentence. `None` for an empty
    /// sentence or one the grammar cannot cover.
    pub fn best_hypothesis(&self) -> Result<Option<&Hypothesis>> {
        self.ensure_filled()?;
        Ok(self.chart_best())
    }

    /// The derivation of [`best_hypothesis`](Self::best_hypothesis), read
    /// back through live children only. Does not modify the chart.
    pub fn best_derivation(&self) -> Result<Option<Derivation>> {
        self.ensure_filled()?;
        nbest::best_derivation(&self.chart, self.ctx.scorer)
    }

    /// Up to `count` best derivations, using the configured `nbest.factor`.
    pub fn calc_nbest(&self, count: usize, distinct: bool) -> Result<Vec<Derivation>> {
        self.calc_nbest_with_factor(count, distinct, self.ctx.settings.nbest.factor)
    }

    pub fn calc_nbest_with_factor(
        &self,
        count: usize,
        distinct: bool,
        factor: usize,
    ) -> Result<Vec<Derivation>> {
        self.ensure_filled()?;
        nbest::calc_nbest(&self.chart, self.ctx.scorer, count, distinct, factor)
    }
}

/// Build, prune and sort the cell for `span`.
fn build_cell(ctx: &SentenceContext<'_>, chart: &Chart, span: Span) -> Result<Cell> {
    let rules = ctx.rules.applicable_rules(span);
    let mut cell = Cell::new(span);
    cell.build(rules, chart, ctx.scorer, ctx.settings.search.retain_arcs)?;
    cell.prune(ctx.settings.search.max_stack_size);
    cell.sort();
    Ok(cell)
}

/// Create a manager for `source` and fill its chart.
pub fn decode<'a>(ctx: SentenceContext<'a>, source: Vec<String>) -> Result<Manager<'a>> {
    let mut manager = Manager::new(ctx, source)?;
    manager.process_sentence()?;
    Ok(manager)
}
