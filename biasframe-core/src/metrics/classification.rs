//! Binary classification metrics (positive class = 1).

use crate::error::{EvalError, EvalResult};

/// Confusion counts for a binary offensive/non-offensive decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryConfusion {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl BinaryConfusion {
    /// Tally aligned label/prediction columns.
    pub fn from_columns(labels: &[u8], predictions: &[u8]) -> EvalResult<Self> {
        EvalError::check_aligned("offensive predictions", labels.len(), predictions.len())?;

        let mut counts = Self::default();
        for (&label, &pred) in labels.iter().zip(predictions) {
            match (label == 1, pred == 1) {
                (true, true) => counts.true_positives += 1,
                (false, false) => counts.true_negatives += 1,
                (false, true) => counts.false_positives += 1,
                (true, false) => counts.false_negatives += 1,
            }
        }
        Ok(counts)
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Fraction of rows where label equals prediction; 0.0 when empty.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.true_positives + self.true_negatives) as f64 / total as f64
        }
    }

    pub fn precision(&self) -> f64 {
        let denom = self.true_positives + self.false_positives;
        if denom == 0 {
            0.0
        } else {
            self.true_positives as f64 / denom as f64
        }
    }

    pub fn recall(&self) -> f64 {
        let denom = self.true_positives + self.false_negatives;
        if denom == 0 {
            0.0
        } else {
            self.true_positives as f64 / denom as f64
        }
    }

    /// `2tp / (2tp + fp + fn)`, 0.0 when there are no positives at all.
    pub fn f1(&self) -> f64 {
        let denom = 2 * self.true_positives + self.false_positives + self.false_negatives;
        if denom == 0 {
            0.0
        } else {
            (2 * self.true_positives) as f64 / denom as f64
        }
    }
}
