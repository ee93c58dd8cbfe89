use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::span::Span;

use super::path::DerivationPath;

struct Contender {
    path: DerivationPath,
    seq: u64,
}

impl PartialEq for Contender {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Contender {}

impl PartialOrd for Contender {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Contender {
    // Higher score first; among equal scores the earlier insertion wins.
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .score()
            .total_cmp(&other.path.score())
            .then(other.seq.cmp(&self.seq))
    }
}

/// Paths waiting to be emitted, best first.
///
/// A derivation can be reached by deviating from several different paths;
/// the frontier accepts each one only the first time it is offered, even if
/// it has since been popped or pruned away.
#[derive(Default)]
pub struct PathFrontier {
    heap: BinaryHeap<Contender>,
    seen: HashSet<Vec<(Span, u32)>>,
    next_seq: u64,
}

impl PathFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path. Returns false if the same derivation was offered before.
    pub fn push(&mut self, path: DerivationPath) -> bool {
        if !self.seen.insert(path.key()) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Contender { path, seq });
        true
    }

    /// Remove and return the best path.
    pub fn pop(&mut self) -> Option<DerivationPath> {
        self.heap.pop().map(|c| c.path)
    }

    pub fn peek_score(&self) -> Option<f64> {
        self.heap.peek().map(|c| c.path.score())
    }

    /// Keep only the `cap` best paths.
    pub fn prune(&mut self, cap: usize) {
        if self.heap.len() <= cap {
            return;
        }
        // Ascending, so the worst come first.
        let mut sorted = std::mem::take(&mut self.heap).into_sorted_vec();
        let excess = sorted.len() - cap;
        sorted.drain(..excess);
        self.heap = BinaryHeap::from(sorted);
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
