//! Bottom-up chart search over source spans.
//!
//! Cells are filled in order of increasing width (CYK+). Each cell combines
//! the rule applications for its span with live hypotheses of narrower
//! cells, recombines hypotheses with equal state, and prunes to a fixed
//! stack size.

mod cell;
mod chart;
mod hypothesis;
mod manager;
#[cfg(test)]
pub(crate) mod testutil;


pub use cell::{Cell, CellStats};
pub use chart::Chart;
pub use hypothesis::{HypId, Hypothesis, RecombinationState};
pub use manager::{decode, DecodeStats, Manager, ManagerState, SentenceContext};
