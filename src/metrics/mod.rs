//! Evaluation metrics.

pub mod classification;

pub use classification::{error_rate, logistic_loss, mean_logistic_loss, sigmoid, BinaryMetrics};
