//! Gradient boosting over [`Cart`](crate::tree::Cart) trees.
//!
//! [`Gbdt`] owns the ensemble and the boosting loop; [`TrainingHistory`]
//! records the per-round losses it reports.

pub mod gbdt;
pub mod history;

pub use gbdt::{initial_bias, residual, FeatureLayout, Gbdt};
pub use history::{RoundRecord, TrainingHistory};
