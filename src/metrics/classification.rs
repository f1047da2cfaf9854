//! Binary classification metrics over raw log-odds scores.
//!
//! Labels are in {-1, +1}; scores are the additive model output before any
//! logistic transform.

use crate::core::error::{GbdtError, Result};
use crate::core::types::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logistic loss `log(1 + exp(-y f))` of one instance.
#[inline]
pub fn logistic_loss(y: Label, f: Score) -> f64 {
    let margin = -(y as f64) * (f as f64);
    // log1p(exp(m)) without overflow for large m
    if margin > 0.0 {
        margin + (-margin).exp().ln_1p()
    } else {
        margin.exp().ln_1p()
    }
}

/// Logistic transform of a log-odds score.
#[inline]
pub fn sigmoid(f: Score) -> Score {
    (1.0 / (1.0 + (-(f as f64)).exp())) as Score
}

fn check_lengths(labels: &[Label], scores: &[Score]) -> Result<()> {
    if labels.len() != scores.len() {
        return Err(GbdtError::dimension_mismatch(
            format!("{} scores", labels.len()),
            format!("{} scores", scores.len()),
        ));
    }
    Ok(())
}

/// Instances per partial sum in reductions. Fixed, so that sums are
/// bit-identical for any worker count.
pub const REDUCTION_BLOCK_SIZE: usize = 4096;

/// Sum `per_instance` over fixed-size chunks, adding the chunk sums in order.
fn chunked_sum<F>(labels: &[Label], scores: &[Score], per_instance: F) -> f64
where
    F: Fn(Label, Score) -> f64 + Sync,
{
    let block = REDUCTION_BLOCK_SIZE;
    let partial: Vec<f64> = labels
        .par_chunks(block)
        .zip(scores.par_chunks(block))
        .map(|(labels, scores)| {
            labels
                .iter()
                .zip(scores)
                .map(|(&y, &f)| per_instance(y, f))
                .sum::<f64>()
        })
        .collect();
    partial.iter().sum()
}

/// Mean logistic loss. Empty input has loss 0.
pub fn mean_logistic_loss(labels: &[Label], scores: &[Score]) -> Result<f64> {
    check_lengths(labels, scores)?;
    if labels.is_empty() {
        return Ok(0.0);
    }
    Ok(chunked_sum(labels, scores, logistic_loss) / labels.len() as f64)
}

/// Fraction of instances whose sign is predicted wrongly; a score of 0
/// predicts +1.
pub fn error_rate(labels: &[Label], scores: &[Score]) -> Result<f64> {
    check_lengths(labels, scores)?;
    if labels.is_empty() {
        return Ok(0.0);
    }
    let wrong = chunked_sum(labels, scores, |y, f| {
        let predicted = if f >= 0.0 { 1.0 } else { -1.0 };
        if predicted != y {
            1.0
        } else {
            0.0
        }
    });
    Ok(wrong / labels.len() as f64)
}

/// Summary of a scored dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub num_instances: usize,
    pub logloss: f64,
    pub error_rate: f64,
}

impl BinaryMetrics {
    /// Evaluate scores against labels.
    pub fn calculate(labels: &[Label], scores: &[Score]) -> Result<Self> {
        Ok(BinaryMetrics {
            num_instances: labels.len(),
            logloss: mean_logistic_loss(labels, scores)?,
            error_rate: error_rate(labels, scores)?,
        })
    }
}

impl fmt::Display for BinaryMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} logloss={:.5} error={:.4}",
            self.num_instances, self.logloss, self.error_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_logistic_loss() {
        assert_relative_eq!(logistic_loss(1.0, 0.0), std::f64::consts::LN_2);
        assert_relative_eq!(logistic_loss(-1.0, 0.0), std::f64::consts::LN_2);
        assert!(logistic_loss(1.0, 5.0) < logistic_loss(1.0, 1.0));
        // Large margins stay finite.
        assert_relative_eq!(logistic_loss(-1.0, 1000.0), 1000.0, epsilon = 1e-9);
        assert!(logistic_loss(1.0, 1000.0) >= 0.0);
    }

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_mean_logistic_loss() {
        let labels = [1.0, -1.0];
        let loss = mean_logistic_loss(&labels, &[0.0, 0.0]).unwrap();
        assert_relative_eq!(loss, std::f64::consts::LN_2);
        assert_eq!(mean_logistic_loss(&[], &[]).unwrap(), 0.0);
        assert!(mean_logistic_loss(&labels, &[0.0]).is_err());
    }

    #[test]
    fn test_error_rate() {
        let labels = [1.0, -1.0, 1.0, -1.0];
        let scores = [0.5, -0.5, -0.1, 0.0];
        assert_relative_eq!(error_rate(&labels, &scores).unwrap(), 0.5);
    }

    #[test]
    fn test_binary_metrics() {
        let metrics = BinaryMetrics::calculate(&[1.0, -1.0], &[2.0, -2.0]).unwrap();
        assert_eq!(metrics.num_instances, 2);
        assert_eq!(metrics.error_rate, 0.0);
        assert!(metrics.to_string().starts_with("n=2"));
    }
}
