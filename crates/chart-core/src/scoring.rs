use crate::rules::RuleApplication;

/// Scores hypotheses while the chart is filled and while n-best paths are
/// rescored.
///
/// `combine` must be pure and deterministic for a fixed configuration, and
/// non-decreasing in each child score; n-best extraction relies on that to
/// enumerate derivations in order.
pub trait ScoreFunction: Send + Sync {
    fn combine(&self, rule: &RuleApplication, child_scores: &[f64]) -> f64;

    /// Output words on each side of a hypothesis that can influence how it
    /// scores as a child. Hypotheses that agree on these recombine.
    fn context_width(&self) -> usize;
}

/// Rule score plus the sum of the child scores.
#[derive(Debug, Clone, Copy)]
pub struct AdditiveScore {
    context_width: usize,
}

impl AdditiveScore {
    pub const fn new(context_width: usize) -> Self {
        Self { context_width }
    }
}

impl ScoreFunction for AdditiveScore {
    fn combine(&self, rule: &RuleApplication, child_scores: &[f64]) -> f64 {
        rule.score + child_scores.iter().sum::<f64>()
    }

    fn context_width(&self) -> usize {
        self.context_width
    }
}
