//! Tree node for the flat, 1-indexed CART node array.
//!
//! A node is either a leaf (`split == None`) or an internal node carrying a
//! [`Split`]. Children of node `k` live at `2k` and `2k + 1`, so nodes keep
//! no explicit child or parent links.

use crate::core::constants::SPARSE_SPLIT_THRESHOLD;
use crate::core::types::{FeatureIndex, LeafIndex, NodeIndex, Score};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Split decision of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Split {
    /// Dense field `feature`; instances with `value < threshold` go left.
    Dense {
        feature: FeatureIndex,
        threshold: Score,
    },
    /// Sparse field at global index `feature` (`nr_field + j`); instances
    /// where the field is absent go left, present go right.
    Sparse { feature: FeatureIndex },
}

impl Split {
    /// Global feature index tested by this split.
    pub fn feature(&self) -> FeatureIndex {
        match *self {
            Split::Dense { feature, .. } | Split::Sparse { feature } => feature,
        }
    }

    /// Threshold applied to the encoded feature value.
    pub fn threshold(&self) -> Score {
        match *self {
            Split::Dense { threshold, .. } => threshold,
            Split::Sparse { .. } => SPARSE_SPLIT_THRESHOLD,
        }
    }

    /// Whether this is a sparse membership split
    pub fn is_sparse(&self) -> bool {
        matches!(self, Split::Sparse { .. })
    }

    /// Route an encoded feature value.
    #[inline]
    pub fn goes_left(&self, value: Score) -> bool {
        value < self.threshold()
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Dense { feature, threshold } => write!(f, "x[{}] < {}", feature, threshold),
            Split::Sparse { feature } => write!(f, "x[{}] absent", feature),
        }
    }
}

/// One slot of a CART node array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    split: Option<Split>,
    gamma: Score,
    idx: LeafIndex,
}

impl TreeNode {
    /// Fresh leaf at array position `idx`.
    pub fn new(idx: NodeIndex) -> Self {
        TreeNode {
            split: None,
            gamma: 0.0,
            idx: idx as LeafIndex,
        }
    }

    /// Whether this node is a leaf
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    /// Split of an internal node, `None` for a leaf
    #[inline]
    pub fn split(&self) -> Option<Split> {
        self.split
    }

    /// Leaf output
    #[inline]
    pub fn gamma(&self) -> Score {
        self.gamma
    }

    /// Leaf identity, equal to the node's array position
    #[inline]
    pub fn idx(&self) -> LeafIndex {
        self.idx
    }

    pub(crate) fn set_split(&mut self, split: Split) {
        self.split = Some(split);
    }

    pub(crate) fn set_gamma(&mut self, gamma: Score) {
        self.gamma = gamma;
    }
}
