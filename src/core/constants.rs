//! Constants and configuration defaults for exact-gbdt.

use crate::core::types::*;

/// Default depth of every tree. A tree of depth `d` has up to `2^d` leaves.
pub const DEFAULT_MAX_DEPTH: usize = 7;

/// Largest accepted tree depth. The node array holds `2^(max_depth+1)` slots.
pub const MAX_SUPPORTED_DEPTH: usize = 20;

/// Default number of trees in the ensemble.
pub const DEFAULT_NUM_TREES: usize = 30;

/// Leaves receiving fewer active instances than this stop being refined.
pub const DEFAULT_MIN_LEAF_SIZE: usize = 100;

/// Default number of worker threads. 0 means use all available cores.
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Default verbosity level for progress reporting.
pub const DEFAULT_VERBOSITY: VerbosityLevel = VerbosityLevel::Info;

/// Leaf curvature sums at or below this value yield a zero leaf output.
pub const NEWTON_DENOMINATOR_EPSILON: Hist = 1e-12;

/// Mean labels are clamped this far inside (-1, 1) before taking log-odds.
pub const BIAS_LABEL_MARGIN: f64 = 1e-6;

/// Threshold used for sparse (membership) splits in the encoded instance.
pub const SPARSE_SPLIT_THRESHOLD: Score = 1.0;

/// Largest sparse field count a problem may declare. Each declared field
/// costs one inverted-list offset, used or not.
pub const MAX_SPARSE_FIELDS: usize = 1 << 24;

/// Prefix of environment variables read by `Config::load_from_environment`.
pub const ENV_PREFIX: &str = "GBDT_";

/// Version string of this crate.
pub const EXACT_GBDT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        assert!(DEFAULT_MAX_DEPTH <= MAX_SUPPORTED_DEPTH);
        assert_eq!(DEFAULT_MIN_LEAF_SIZE, 100);
        assert!(NEWTON_DENOMINATOR_EPSILON > 0.0);
        assert!(!EXACT_GBDT_VERSION.is_empty());
    }
}
