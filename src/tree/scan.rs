//! Exact split search for one tree level.
//!
//! Every field is scanned against a private copy of the per-leaf running
//! sums and produces its own best split per leaf. Per-field results are then
//! merged into the shared per-leaf best under a mutex. The acceptance rule
//! (strictly higher score, or equal score on a lower feature index) is a
//! total order on candidates, so the merged result does not depend on the
//! order in which fields finish.

use super::node::Split;
use crate::core::types::*;
use crate::dataset::{DenseNode, Problem};
use std::sync::{Mutex, PoisonError};

/// Per-instance state while a tree is being grown.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Location {
    /// Node the instance currently sits in
    pub tnode_idx: NodeIndex,
    /// Residual being fit
    pub r: Score,
    /// Leaf was finalized early; `tnode_idx` no longer moves
    pub shrinked: bool,
}

impl Location {
    pub fn new(r: Score) -> Self {
        Location {
            tnode_idx: 1,
            r,
            shrinked: false,
        }
    }
}

/// Residual sum and active instance count of one leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LeafStats {
    pub s: Hist,
    pub n: usize,
}

impl LeafStats {
    /// Score of leaving the leaf unsplit, `s²/n`.
    pub fn baseline(&self) -> Option<Hist> {
        if self.n == 0 {
            None
        } else {
            Some(self.s * self.s / self.n as Hist)
        }
    }
}

/// Split score `sl²/nl + sr²/nr`, or `None` when one side would be empty.
#[inline]
pub fn split_score(sl: Hist, nl: usize, stats: &LeafStats) -> Option<Hist> {
    if nl == 0 || nl >= stats.n {
        return None;
    }
    let sr = stats.s - sl;
    let nr = stats.n - nl;
    Some(sl * sl / nl as Hist + sr * sr / nr as Hist)
}

/// Best split found so far for one leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestSplit {
    pub score: Hist,
    pub split: Option<Split>,
}

impl BestSplit {
    /// Start from the unsplit score of a leaf.
    pub fn baseline(stats: &LeafStats) -> Self {
        BestSplit {
            score: stats.baseline().unwrap_or(Hist::NEG_INFINITY),
            split: None,
        }
    }

    /// Offer a candidate, returning whether it was taken.
    ///
    /// A candidate replaces the current best when its score is strictly
    /// higher, or equal with a lower feature index. Equalling the unsplit
    /// baseline is never enough.
    pub fn offer(&mut self, score: Hist, split: Split) -> bool {
        let accept = if score > self.score {
            true
        } else {
            match self.split {
                Some(current) => score == self.score && split.feature() < current.feature(),
                None => false,
            }
        };
        if accept {
            self.score = score;
            self.split = Some(split);
        }
        accept
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Running {
    sl: Hist,
    nl: usize,
    last: Option<Score>,
}

/// Threshold strictly above `left` and no larger than `right`.
#[inline]
pub fn midpoint_threshold(left: Score, right: Score) -> Score {
    let mid = ((left as f64 + right as f64) * 0.5) as Score;
    if mid > left {
        mid
    } else {
        right
    }
}

/// Scan one value-sorted dense column.
///
/// Within a leaf, candidates are evaluated at every change of value before
/// the current instance is moved to the left side, so a candidate always
/// separates distinct values. Ties inside the column keep the first
/// (lowest-threshold) candidate.
pub(crate) fn scan_dense_field(
    column: &[DenseNode],
    locations: &[Location],
    stats: &[LeafStats],
    baseline: &[BestSplit],
    idx_offset: NodeIndex,
    feature: FeatureIndex,
) -> Vec<BestSplit> {
    let mut running = vec![Running::default(); stats.len()];
    let mut best = baseline.to_vec();

    for node in column {
        let location = &locations[node.row as usize];
        if location.shrinked {
            continue;
        }
        let leaf = location.tnode_idx - idx_offset;
        let run = &mut running[leaf];

        if let Some(prev) = run.last {
            if node.value != prev {
                if let Some(score) = split_score(run.sl, run.nl, &stats[leaf]) {
                    best[leaf].offer(
                        score,
                        Split::Dense {
                            feature,
                            threshold: midpoint_threshold(prev, node.value),
                        },
                    );
                }
            }
        }

        run.sl += location.r as Hist;
        run.nl += 1;
        run.last = Some(node.value);
    }

    best
}

/// Scan one sparse field through its inverted list.
pub(crate) fn scan_sparse_field(
    problem: &Problem,
    j: usize,
    locations: &[Location],
    stats: &[LeafStats],
    baseline: &[BestSplit],
    idx_offset: NodeIndex,
) -> Vec<BestSplit> {
    let mut present = vec![(0.0 as Hist, 0usize); stats.len()];
    for &i in problem.instances_of(j) {
        let location = &locations[i as usize];
        if location.shrinked {
            continue;
        }
        let side = &mut present[location.tnode_idx - idx_offset];
        side.0 += location.r as Hist;
        side.1 += 1;
    }

    let feature = problem.nr_field() + j;
    let mut best = baseline.to_vec();
    for (leaf, &(sl, nl)) in present.iter().enumerate() {
        if let Some(score) = split_score(sl, nl, &stats[leaf]) {
            best[leaf].offer(score, Split::Sparse { feature });
        }
    }
    best
}

/// Merge one field's per-leaf results into the shared best.
pub(crate) fn merge(shared: &Mutex<Vec<BestSplit>>, local: &[BestSplit]) {
    let mut best = shared.lock().unwrap_or_else(PoisonError::into_inner);
    for (best, candidate) in best.iter_mut().zip(local) {
        if let Some(split) = candidate.split {
            best.offer(candidate.score, split);
        }
    }
}
