//! Fixed-depth regression tree (CART) grown level by level.
//!
//! Nodes live in a complete binary tree stored as a flat array of
//! `2^(max_depth + 1)` slots. Slot 0 is unused, node 1 is the root and
//! node `k` has children `2k` and `2k + 1`.

use super::node::{Split, TreeNode};
use super::scan::{self, BestSplit, LeafStats, Location};
use crate::core::constants::*;
use crate::core::error::{GbdtError, Result};
use crate::core::types::*;
use crate::core::utils::threading::current_static_block_size;
use crate::dataset::Problem;
use crate::ensure;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Growth parameters shared by every tree of an ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Number of levels grown
    pub max_depth: usize,
    /// New leaves with fewer active instances are finalized
    pub min_leaf_size: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: DEFAULT_MAX_DEPTH,
            min_leaf_size: DEFAULT_MIN_LEAF_SIZE,
        }
    }
}

impl TreeParams {
    /// Size of the node array, `2^(max_depth + 1)`.
    pub fn max_tnodes(&self) -> usize {
        1usize << (self.max_depth + 1)
    }
}

/// Leaf reached by an instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafHit {
    /// Leaf identity (node array position)
    pub index: LeafIndex,
    /// Leaf output
    pub value: Score,
}

/// One regression tree.
///
/// Deserialized trees go through [`Cart::validate_structure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CartNodes")]
pub struct Cart {
    params: TreeParams,
    nodes: Vec<TreeNode>,
}

#[derive(Deserialize)]
struct CartNodes {
    params: TreeParams,
    nodes: Vec<TreeNode>,
}

impl TryFrom<CartNodes> for Cart {
    type Error = GbdtError;

    fn try_from(raw: CartNodes) -> Result<Self> {
        Cart::from_nodes(raw.params, raw.nodes)
    }
}

impl Cart {
    /// Empty tree: a single root leaf with output 0.
    pub fn new(params: TreeParams) -> Self {
        Cart {
            params,
            nodes: fresh_nodes(params.max_tnodes()),
        }
    }

    /// Rebuild a tree from its node array, checking its structure.
    pub fn from_nodes(params: TreeParams, nodes: Vec<TreeNode>) -> Result<Self> {
        let tree = Cart { params, nodes };
        tree.validate_structure()?;
        Ok(tree)
    }

    /// Growth parameters
    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Number of levels
    pub fn max_depth(&self) -> usize {
        self.params.max_depth
    }

    /// Length of the node array
    pub fn max_tnodes(&self) -> usize {
        self.nodes.len()
    }

    /// The node array, including the unused slot 0
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Node at array position `idx`
    pub fn node(&self, idx: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(idx)
    }

    /// Number of internal nodes
    pub fn num_splits(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_leaf()).count()
    }

    /// Grow the tree against `residuals` and write each training instance's
    /// leaf output into `predictions`.
    ///
    /// Any previous content of the tree is discarded. Must be called from
    /// within the thread pool that should do the work.
    pub fn fit(&mut self, problem: &Problem, residuals: &[Score], predictions: &mut [Score]) -> Result<()> {
        let nr_instance = problem.nr_instance();
        if residuals.len() != nr_instance {
            return Err(GbdtError::dimension_mismatch(
                format!("{} residuals", nr_instance),
                format!("{} residuals", residuals.len()),
            ));
        }
        if predictions.len() != nr_instance {
            return Err(GbdtError::dimension_mismatch(
                format!("{} predictions", nr_instance),
                format!("{} predictions", predictions.len()),
            ));
        }
        ensure!(
            self.params.max_depth >= 1 && self.params.max_depth <= MAX_SUPPORTED_DEPTH,
            GbdtError::invalid_parameter(
                "max_depth",
                self.params.max_depth.to_string(),
                format!("must be in range [1, {}]", MAX_SUPPORTED_DEPTH),
            )
        );

        self.nodes = fresh_nodes(self.params.max_tnodes());

        let block = current_static_block_size(nr_instance);
        let mut locations = vec![Location::new(0.0); nr_instance];
        locations
            .par_chunks_mut(block)
            .zip(residuals.par_chunks(block))
            .for_each(|(locations, residuals)| {
                for (location, &r) in locations.iter_mut().zip(residuals) {
                    location.r = r;
                }
            });

        let mut idx_offset: NodeIndex = 1;
        for d in 0..self.params.max_depth {
            self.grow_level(problem, &mut locations, d, idx_offset, block);
            idx_offset *= 2;
        }

        self.assign_gammas(&locations);

        let nodes = &self.nodes;
        predictions
            .par_chunks_mut(block)
            .zip(locations.par_chunks(block))
            .for_each(|(predictions, locations)| {
                for (f, location) in predictions.iter_mut().zip(locations) {
                    *f = nodes[location.tnode_idx].gamma();
                }
            });

        Ok(())
    }

    fn grow_level(
        &mut self,
        problem: &Problem,
        locations: &mut [Location],
        d: usize,
        idx_offset: NodeIndex,
        block: usize,
    ) {
        let max_nr_leaf = 1usize << d;

        let mut stats = vec![LeafStats::default(); max_nr_leaf];
        for location in locations.iter().filter(|l| !l.shrinked) {
            let leaf = &mut stats[location.tnode_idx - idx_offset];
            leaf.s += location.r as Hist;
            leaf.n += 1;
        }
        let baseline: Vec<BestSplit> = stats.iter().map(BestSplit::baseline).collect();
        let shared = Mutex::new(baseline.clone());

        {
            let locations: &[Location] = locations;
            (0..problem.nr_field())
                .into_par_iter()
                .with_max_len(1)
                .for_each(|j| {
                    let local = scan::scan_dense_field(
                        problem.sorted_column(j),
                        locations,
                        &stats,
                        &baseline,
                        idx_offset,
                        j,
                    );
                    scan::merge(&shared, &local);
                });

            (0..problem.nr_sparse_field())
                .into_par_iter()
                .with_max_len(1)
                .for_each(|j| {
                    let local =
                        scan::scan_sparse_field(problem, j, locations, &stats, &baseline, idx_offset);
                    scan::merge(&shared, &local);
                });
        }

        let best = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut nr_split = 0usize;
        for (leaf, candidate) in best.iter().enumerate() {
            if let Some(split) = candidate.split {
                self.nodes[idx_offset + leaf].set_split(split);
                nr_split += 1;
            }
        }

        let nodes = &self.nodes;
        let nr_field = problem.nr_field();
        locations
            .par_chunks_mut(block)
            .enumerate()
            .for_each(|(c, chunk)| {
                for (k, location) in chunk.iter_mut().enumerate() {
                    if location.shrinked {
                        continue;
                    }
                    let i = c * block + k;
                    let idx = location.tnode_idx;
                    location.tnode_idx = match nodes[idx].split() {
                        None => {
                            location.shrinked = true;
                            idx
                        }
                        Some(Split::Dense { feature, threshold }) => {
                            if problem.value(i, feature) < threshold {
                                2 * idx
                            } else {
                                2 * idx + 1
                            }
                        }
                        Some(Split::Sparse { feature }) => {
                            let j = (feature - nr_field) as FieldIndex;
                            if problem.is_active(i, j) {
                                2 * idx + 1
                            } else {
                                2 * idx
                            }
                        }
                    };
                }
            });

        let idx_offset_next = idx_offset * 2;
        let mut counter = vec![0usize; max_nr_leaf * 2];
        for location in locations.iter().filter(|l| !l.shrinked) {
            counter[location.tnode_idx - idx_offset_next] += 1;
        }
        let min_leaf_size = self.params.min_leaf_size;
        locations.par_chunks_mut(block).for_each(|chunk| {
            for location in chunk.iter_mut().filter(|l| !l.shrinked) {
                if counter[location.tnode_idx - idx_offset_next] < min_leaf_size {
                    location.shrinked = true;
                }
            }
        });

        log::debug!(
            "depth {}: {} active leaves, {} splits, {} instances still active",
            d,
            stats.iter().filter(|s| s.n > 0).count(),
            nr_split,
            locations.iter().filter(|l| !l.shrinked).count()
        );
    }

    fn assign_gammas(&mut self, locations: &[Location]) {
        let mut sums = vec![(0.0 as Hist, 0.0 as Hist); self.nodes.len()];
        for location in locations {
            let r = location.r as Hist;
            let sum = &mut sums[location.tnode_idx];
            sum.0 += r;
            sum.1 += r.abs() * (1.0 - r.abs());
        }

        for (node, &(a, b)) in self.nodes.iter_mut().zip(&sums).skip(1) {
            node.set_gamma(newton_step(a, b));
        }
    }

    /// Route an encoded instance to its leaf.
    ///
    /// `x` holds dense values followed by one 0/1 slot per sparse field.
    pub fn predict(&self, x: &[Score]) -> Result<LeafHit> {
        let mut idx: NodeIndex = 1;
        for _ in 0..=self.params.max_depth {
            let node = self.nodes.get(idx).ok_or_else(|| {
                GbdtError::prediction(format!("node {} outside the node array", idx))
            })?;
            let split = match node.split() {
                None => {
                    return Ok(LeafHit {
                        index: node.idx(),
                        value: node.gamma(),
                    })
                }
                Some(split) => split,
            };
            let value = x.get(split.feature()).ok_or_else(|| {
                GbdtError::dimension_mismatch(
                    format!("more than {} encoded features", split.feature()),
                    format!("{} encoded features", x.len()),
                )
            })?;
            idx = if split.goes_left(*value) { 2 * idx } else { 2 * idx + 1 };
        }

        debug_assert!(false, "traversal passed depth {}", self.params.max_depth);
        Err(GbdtError::prediction(format!(
            "traversal passed depth {} without reaching a leaf",
            self.params.max_depth
        )))
    }

    /// Check the node array shape: correct length, node ids matching array
    /// positions, no split on the last level and no split below a leaf.
    pub fn validate_structure(&self) -> Result<()> {
        let expected = self.params.max_tnodes();
        if self.nodes.len() != expected {
            return Err(GbdtError::tree_construction(format!(
                "node array holds {} slots, expected {}",
                self.nodes.len(),
                expected
            )));
        }

        let first_bottom = 1usize << self.params.max_depth;
        for (k, node) in self.nodes.iter().enumerate() {
            if node.idx() as usize != k {
                return Err(GbdtError::tree_construction(format!(
                    "node at position {} carries id {}",
                    k,
                    node.idx()
                )));
            }
            if node.is_leaf() {
                continue;
            }
            if k == 0 || k >= first_bottom {
                return Err(GbdtError::tree_construction(format!(
                    "node {} cannot hold a split",
                    k
                )));
            }
            if k > 1 && self.nodes[k / 2].is_leaf() {
                return Err(GbdtError::tree_construction(format!(
                    "node {} is split below leaf {}",
                    k,
                    k / 2
                )));
            }
        }
        Ok(())
    }
}

/// Newton leaf output `a / b` for logistic loss, floored to 0 when the
/// curvature sum is negligible.
#[inline]
pub fn newton_step(a: Hist, b: Hist) -> Score {
    if b <= NEWTON_DENOMINATOR_EPSILON {
        0.0
    } else {
        (a / b) as Score
    }
}

fn fresh_nodes(max_tnodes: usize) -> Vec<TreeNode> {
    (0..max_tnodes).map(TreeNode::new).collect()
}
