//! Per-epoch training history and model-selection bookkeeping.

use serde::Serialize;
use std::path::Path;

use crate::error::EvalResult;
use crate::report::MetricReport;

/// Dev metric that drives model selection.
pub const SELECTION_METRIC: &str = "offensive-F1";

/// One completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochRecord {
    pub epoch: usize,
    /// Mean batch loss over the epoch.
    pub train_loss: f64,
    pub dev: MetricReport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochRecord>,
    pub best_epoch: Option<usize>,
    pub best_score: Option<f64>,
    pub stopped_early: bool,
}

impl TrainingHistory {
    /// Append an epoch; returns true when it sets a new best selection score.
    pub fn record_epoch(&mut self, train_loss: f64, dev: MetricReport) -> bool {
        let epoch = self.epochs.len() + 1;
        let score = dev.score(SELECTION_METRIC).unwrap_or(0.0);
        self.epochs.push(EpochRecord {
            epoch,
            train_loss,
            dev,
        });

        let improved = self.best_score.is_none_or(|best| score > best);
        if improved {
            self.best_score = Some(score);
            self.best_epoch = Some(epoch);
        }
        improved
    }

    pub fn epochs_completed(&self) -> usize {
        self.epochs.len()
    }

    pub fn save(&self, path: &Path) -> EvalResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
