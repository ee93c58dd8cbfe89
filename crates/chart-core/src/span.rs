use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An inclusive range of source token positions.
///
/// Spans order by width first and start position second, which is the order
/// the chart is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct Span {
    /// First covered position (inclusive)
    pub start: usize,
    /// Last covered position (inclusive)
    pub end: usize,
}

impl Span {
    /// # Panics
    ///
    /// Panics if `start > end`. Use [`Span::try_new`] or `TryFrom` for
    /// positions that come from input.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "span start {start} is after end {end}");
        Self { start, end }
    }

    /// `None` if `start > end`.
    pub fn try_new(start: usize, end: usize) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// The span covering a whole sentence of `len` tokens, if any.
    pub fn full(len: usize) -> Option<Self> {
        (len > 0).then(|| Self::new(0, len - 1))
    }

    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos <= self.end
    }

    pub fn covers(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        self.width()
            .cmp(&other.width())
            .then(self.start.cmp(&other.start))
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.start, self.end)
    }
}

impl TryFrom<(usize, usize)> for Span {
    type Error = String;

    fn try_from((start, end): (usize, usize)) -> Result<Self, Self::Error> {
        Self::try_new(start, end).ok_or_else(|| format!("span start {start} is after end {end}"))
    }
}

impl From<Span> for (usize, usize) {
    fn from(span: Span) -> Self {
        (span.start, span.end)
    }
}
