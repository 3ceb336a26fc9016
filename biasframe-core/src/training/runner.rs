//! Fit loop driver: shuffled batches per epoch, dev validation, early stopping.

use rand::rngs::StdRng;

use super::callbacks::{CallbackAction, EarlyStopping};
use super::history::{SELECTION_METRIC, TrainingHistory};
use crate::config::TrainingConfig;
use crate::data::Partition;
use crate::error::EvalResult;
use crate::model::BiasFrameModel;
use crate::report::{EvaluationTable, MetricReport, ReportBuilder};

/// Runs the fit loop for one experiment.
pub struct TrainingRunner<'a> {
    config: &'a TrainingConfig,
    builder: &'a ReportBuilder,
}

impl<'a> TrainingRunner<'a> {
    pub fn new(config: &'a TrainingConfig, builder: &'a ReportBuilder) -> Self {
        Self { config, builder }
    }

    /// Train `model` on `train`, validating on `dev` after every epoch.
    pub fn train(
        &self,
        model: &mut dyn BiasFrameModel,
        train: &Partition,
        dev: &Partition,
        rng: &mut StdRng,
    ) -> EvalResult<TrainingHistory> {
        let mut history = TrainingHistory::default();
        let mut early_stopping = EarlyStopping::new(self.config.early_stopping_patience);

        tracing::info!(
            model = model.name(),
            train_rows = train.len(),
            dev_rows = dev.len(),
            epochs = self.config.epochs,
            "Starting training"
        );

        for epoch in 1..=self.config.epochs {
            let rows = train.shuffled(rng);
            let mut loss_sum = 0.0;
            let mut batches = 0usize;
            for batch in rows.chunks(self.config.batch_size.max(1)) {
                loss_sum += model.fit_batch(batch)?;
                batches += 1;
            }
            let train_loss = if batches == 0 {
                0.0
            } else {
                loss_sum / batches as f64
            };

            let dev_report = self.validate(model, dev)?;
            let score = dev_report.score(SELECTION_METRIC).unwrap_or(0.0);
            let improved = history.record_epoch(train_loss, dev_report);
            tracing::info!(epoch, train_loss, dev_f1 = score, improved, "Epoch complete");

            if early_stopping.on_epoch_end(improved) == CallbackAction::Stop {
                tracing::info!(epoch, "Early stopping: no dev improvement");
                history.stopped_early = true;
                break;
            }
        }

        tracing::info!(
            best_epoch = ?history.best_epoch,
            best_score = ?history.best_score,
            "Training finished"
        );
        Ok(history)
    }

    /// Classification-only pass over `partition`; generation is skipped.
    pub fn validate(
        &self,
        model: &dyn BiasFrameModel,
        partition: &Partition,
    ) -> EvalResult<MetricReport> {
        let mut decisions = Vec::with_capacity(partition.len());
        for batch in partition.batches(self.config.batch_size) {
            decisions.extend(model.classify(batch)?);
        }
        let table = EvaluationTable::from_classifications(&partition.examples, &decisions)?;
        self.builder.classification_report(&table)
    }
}
