//! Core data types for exact-gbdt.
//!
//! Numeric aliases are kept narrow where they are stored per instance
//! (residuals, scores, row ids) and wide where they accumulate
//! (per-leaf sums), so that million-row problems stay cache friendly
//! without losing precision in the split scores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identifier inside a [`Problem`](crate::dataset::Problem).
/// 32-bit integer supporting up to 4 billion instances.
pub type InstanceIndex = u32;

/// Per-instance prediction, residual and leaf output type.
pub type Score = f32;

/// Label type. Binary labels are encoded as `-1.0` / `+1.0`.
pub type Label = f32;

/// Accumulator type used for residual sums and split scores.
pub type Hist = f64;

/// Index of a sparse field inside the per-field inverted lists.
pub type FieldIndex = u32;

/// Global feature index: dense fields occupy `0..nr_field`, sparse
/// field `j` lives at `nr_field + j`.
pub type FeatureIndex = usize;

/// Position of a node inside a tree's flat, 1-indexed node array.
pub type NodeIndex = usize;

/// Leaf identity reported by `get_indices`.
pub type LeafIndex = u32;

/// Boosting round number.
pub type IterationIndex = usize;

/// Verbosity levels for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// No progress output
    Silent,
    /// One line per boosting round
    Info,
}

impl Default for VerbosityLevel {
    fn default() -> Self {
        VerbosityLevel::Info
    }
}

impl fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbosityLevel::Silent => write!(f, "silent"),
            VerbosityLevel::Info => write!(f, "info"),
        }
    }
}

impl VerbosityLevel {
    /// Whether per-round progress lines should be emitted.
    pub fn reports_rounds(&self) -> bool {
        *self >= VerbosityLevel::Info
    }
}
