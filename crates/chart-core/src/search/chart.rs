use crate::error::{DecodeError, Result};
use crate::rules::RuleApplication;
use crate::span::Span;

use super::cell::Cell;
use super::hypothesis::{HypId, Hypothesis};

/// Cells for every span of one sentence.
///
/// A cell appears only once it has been built, pruned and sorted, so lookups
/// of a span that is not yet complete fail instead of seeing partial state.
#[derive(Debug, Clone)]
pub struct Chart {
    len: usize,
    /// One slot per span, grouped by width, then ordered by start
    cells: Vec<Option<Cell>>,
}

impl Chart {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            cells: vec![None; len * (len + 1) / 2],
        }
    }

    /// Sentence length in tokens.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot(&self, span: Span) -> Result<usize> {
        if span.end >= self.len {
            return Err(DecodeError::SpanOutOfRange {
                span,
                len: self.len,
            });
        }
        // Widths below this one take len, len - 1, ... slots.
        let narrower = span.width() - 1;
        Ok(narrower * self.len - narrower * narrower.saturating_sub(1) / 2 + span.start)
    }

    /// The completed cell for `span`.
    pub fn cell(&self, span: Span) -> Result<&Cell> {
        let slot = self.slot(span)?;
        self.cells[slot]
            .as_ref()
            .ok_or(DecodeError::UnfilledSpan(span))
    }

    pub fn hypothesis(&self, id: HypId) -> Result<&Hypothesis> {
        self.cell(id.span)?
            .get(id.index)
            .ok_or(DecodeError::UnknownHypothesis(id))
    }

    /// The rule application `id` was built from.
    pub fn rule(&self, id: HypId) -> Result<&RuleApplication> {
        let cell = self.cell(id.span)?;
        let hyp = cell.get(id.index).ok_or(DecodeError::UnknownHypothesis(id))?;
        cell.rule(hyp.rule)
            .ok_or(DecodeError::UnknownHypothesis(id))
    }

    /// Completed cells in fill order (by width, then start).
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter_map(Option::as_ref)
    }

    pub(crate) fn insert(&mut self, cell: Cell) -> Result<()> {
        let slot = self.slot(cell.span())?;
        self.cells[slot] = Some(cell);
        Ok(())
    }
}
