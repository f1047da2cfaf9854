//! # exact-gbdt
//!
//! Gradient-boosted decision trees for binary classification under
//! logistic loss, with exact (histogram-free) split search over dense and
//! sparse fields.
//!
//! ## Features
//!
//! - **Exact splits**: every distinct value of every dense field is a split
//!   candidate; sparse fields split on presence.
//! - **Deterministic parallelism**: per-field scans run on a Rayon pool and
//!   merge with a fixed tie-break, so the trees do not depend on the thread
//!   count.
//! - **Newton leaves**: leaf outputs are one Newton step on logistic loss.
//! - **Leaf encoding**: [`Gbdt::get_indices`] and [`Gbdt::transform`] expose
//!   the leaf reached in every tree, for use as derived features.
//!
//! ## Quick Start
//!
//! ```rust
//! use exact_gbdt::{ConfigBuilder, Gbdt, Problem};
//! use ndarray::array;
//!
//! # fn main() -> exact_gbdt::Result<()> {
//! let features = array![[0.1f32], [0.2], [0.8], [0.9]];
//! let labels = array![1.0f32, 1.0, -1.0, -1.0];
//! let train = Problem::new(features, Vec::new(), 0, labels)?;
//!
//! let config = ConfigBuilder::new()
//!     .max_depth(2)
//!     .num_trees(5)
//!     .min_leaf_size(1)
//!     .build()?;
//!
//! let mut model = Gbdt::new(config)?;
//! let history = model.fit(&train, None)?;
//! assert_eq!(history.len(), 5);
//! assert!(model.predict(&[0.15])? > 0.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: numeric types, constants, error handling, thread pools
//! - [`config`]: training configuration
//! - [`dataset`]: the [`Problem`] container and its text loader
//! - [`tree`]: the CART tree and exact split search
//! - [`boosting`]: the boosting loop and ensemble
//! - [`metrics`]: logistic loss and error rate
//! - [`io`]: model persistence

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Dataset container and loading
pub mod dataset;

// Regression trees
pub mod tree;

// Boosting module
pub mod boosting;

// Evaluation metrics
pub mod metrics;

// Model persistence
pub mod io;

// Re-export core functionality for convenience
pub use crate::core::{
    constants::*,
    error::{GbdtError, Result},
    types::*,
};

pub use crate::boosting::{Gbdt, RoundRecord, TrainingHistory};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::dataset::{Problem, ProblemLoader};
pub use crate::io::{load_model, save_model, ModelFormat};
pub use crate::metrics::{error_rate, logistic_loss, mean_logistic_loss, BinaryMetrics};
pub use crate::tree::{Cart, LeafHit, Split, TreeNode, TreeParams};

// Version information
pub use crate::core::constants::EXACT_GBDT_VERSION as VERSION;

/// Initialize the library.
///
/// Installs an `env_logger` logger (defaulting `RUST_LOG` to `info`) unless
/// the host application already installed one. Calling it more than once
/// is harmless.
///
/// ```rust
/// fn main() -> exact_gbdt::Result<()> {
///     exact_gbdt::init()?;
///     assert!(exact_gbdt::is_initialized());
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    crate::core::initialize_core()
}

/// Check if the library has been initialized.
pub fn is_initialized() -> bool {
    crate::core::is_core_initialized()
}
