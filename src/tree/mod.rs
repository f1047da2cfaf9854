//! Regression trees for gradient boosting.
//!
//! - [`node`]: node array slots and split decisions
//! - [`scan`]: exact per-level split search over dense and sparse fields
//! - [`cart`]: the fixed-depth tree, its fit and its traversal

pub mod cart;
pub mod node;
pub mod scan;

pub use cart::{newton_step, Cart, LeafHit, TreeParams};
pub use node::{Split, TreeNode};
pub use scan::{split_score, BestSplit, LeafStats};
