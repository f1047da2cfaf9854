//! Per-round training record.

use crate::core::types::IterationIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one boosting round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Zero-based tree number
    pub iteration: IterationIndex,
    /// Wall time spent on the round
    pub elapsed_secs: f64,
    /// Mean training logistic loss after adding the tree
    pub train_loss: f64,
    /// Mean validation logistic loss, when a validation set was supplied
    pub valid_loss: Option<f64>,
}

impl fmt::Display for RoundRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:3} {:8.2} {:10.5}",
            self.iteration, self.elapsed_secs, self.train_loss
        )?;
        if let Some(valid_loss) = self.valid_loss {
            write!(f, " {:10.5}", valid_loss)?;
        }
        Ok(())
    }
}

/// All rounds of one fit, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    records: Vec<RoundRecord>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: RoundRecord) {
        self.records.push(record);
    }

    /// Recorded rounds
    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    /// Number of rounds
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Last round, if any
    pub fn last(&self) -> Option<&RoundRecord> {
        self.records.last()
    }

    /// Training loss of every round.
    pub fn train_losses(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.train_loss).collect()
    }

    /// Validation loss of every round, empty without a validation set.
    pub fn valid_losses(&self) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.valid_loss).collect()
    }

    /// Total wall time of the fit
    pub fn total_secs(&self) -> f64 {
        self.records.iter().map(|r| r.elapsed_secs).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(iteration: usize, valid_loss: Option<f64>) -> RoundRecord {
        RoundRecord {
            iteration,
            elapsed_secs: 0.5,
            train_loss: 0.25,
            valid_loss,
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(record(3, None).to_string(), "  3     0.50    0.25000");
        assert_eq!(
            record(12, Some(0.3)).to_string(),
            " 12     0.50    0.25000    0.30000"
        );
    }

    #[test]
    fn test_history() {
        let mut history = TrainingHistory::new();
        assert!(history.is_empty());
        history.push(record(0, Some(0.4)));
        history.push(record(1, Some(0.3)));
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().iteration, 1);
        assert_eq!(history.train_losses(), vec![0.25, 0.25]);
        assert_eq!(history.valid_losses(), vec![0.4, 0.3]);
        assert_eq!(history.total_secs(), 1.0);
    }
}
