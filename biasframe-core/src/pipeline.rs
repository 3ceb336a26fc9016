//! End-to-end run: dump config → prepare partitions → train → evaluate test
//! and every additional test partition.

use std::path::PathBuf;

use crate::config::RunConfig;
use crate::data::Partitions;
use crate::error::EvalResult;
use crate::evaluate::evaluate;
use crate::metrics::{Bleu, RougeL};
use crate::model::BiasFrameModel;
use crate::report::{MetricReport, ReportBuilder};
use crate::training::{SeedManager, TrainingHistory, TrainingRunner};

pub const TRAINING_HISTORY_FILE: &str = "training_history.json";

/// Split name under which every held-out partition is evaluated.
pub const TEST_SPLIT: &str = "test";

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub config_path: PathBuf,
    pub history: TrainingHistory,
    /// `(prefix, report)` in evaluation order, `test` first.
    pub reports: Vec<(String, MetricReport)>,
}

/// Drive one experiment with an already-built model.
pub fn run_experiment(conf: &RunConfig, model: &mut dyn BiasFrameModel) -> EvalResult<RunSummary> {
    conf.validate()?;
    let mut seeds = SeedManager::new(conf.seed);
    let config_path = conf.dump()?;
    tracing::info!(path = %config_path.display(), seed = conf.seed, "Resolved config written");

    let partitions = Partitions::prepare(&conf.data_config)?;
    let data = &conf.data_config;
    let builder = ReportBuilder::new(Bleu::new(conf.metrics.bleu_n_gram), RougeL::new());

    let mut rng = seeds.rng("train-shuffle");
    let history = TrainingRunner::new(&conf.training, &builder).train(
        model,
        partitions.get(&data.train)?,
        partitions.get(&data.dev)?,
        &mut rng,
    )?;
    history.save(&conf.output_dir.join(TRAINING_HISTORY_FILE))?;

    let mut reports = Vec::with_capacity(1 + data.additional_test.len());
    let report = evaluate(
        conf,
        &*model,
        &builder,
        TEST_SPLIT,
        partitions.get(&data.test)?,
        None,
    )?;
    reports.push((TEST_SPLIT.to_string(), report));

    for split in &data.additional_test {
        let report = evaluate(
            conf,
            &*model,
            &builder,
            TEST_SPLIT,
            partitions.get(split)?,
            Some(split.as_str()),
        )?;
        reports.push((split.clone(), report));
    }

    Ok(RunSummary {
        config_path,
        history,
        reports,
    })
}
