//! Partition evaluation: batched inference, report building, persistence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::data::Partition;
use crate::error::EvalResult;
use crate::model::BiasFrameModel;
use crate::report::{EvaluationTable, MetricReport, ReportBuilder};

/// Where one evaluation pass lands inside `output_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub metrics: PathBuf,
    pub predictions: PathBuf,
}

impl ReportPaths {
    pub fn new(output_dir: &Path, prefix: &str) -> Self {
        Self {
            metrics: output_dir.join(format!("{prefix}_metrics.json")),
            predictions: output_dir.join(format!("{prefix}_predictions.jsonl")),
        }
    }
}

/// On-disk form of a metric report.
#[derive(Debug, Serialize)]
pub struct PersistedReport<'a> {
    pub split: &'a str,
    pub prefix: &'a str,
    pub rows: usize,
    pub config_fingerprint: String,
    pub generated_at: DateTime<Utc>,
    pub metrics: &'a MetricReport,
}

/// Run `model` over `partition` in row-order batches and join the outputs
/// with the references.
pub fn infer(
    model: &dyn BiasFrameModel,
    partition: &Partition,
    batch_size: usize,
) -> EvalResult<EvaluationTable> {
    let mut predictions = Vec::with_capacity(partition.len());
    for (idx, batch) in partition.batches(batch_size).enumerate() {
        predictions.extend(model.predict(batch)?);
        tracing::debug!(partition = %partition.name, batch = idx, "Inference batch done");
    }
    EvaluationTable::from_predictions(&partition.examples, predictions)
}

/// Evaluate one partition and persist its report under
/// `eval_prefix`, falling back to `split_name`.
///
/// Writes `{prefix}_metrics.json` and `{prefix}_predictions.jsonl` into
/// `conf.output_dir`, replacing earlier files with the same prefix.
pub fn evaluate(
    conf: &RunConfig,
    model: &dyn BiasFrameModel,
    builder: &ReportBuilder,
    split_name: &str,
    partition: &Partition,
    eval_prefix: Option<&str>,
) -> EvalResult<MetricReport> {
    let prefix = eval_prefix.unwrap_or(split_name);
    tracing::info!(
        split = split_name,
        prefix,
        partition = %partition.name,
        rows = partition.len(),
        "Evaluating"
    );

    let table = infer(model, partition, conf.training.batch_size)?;
    let report = builder.full_report(&table)?;

    std::fs::create_dir_all(&conf.output_dir)?;
    let paths = ReportPaths::new(&conf.output_dir, prefix);
    table.write_jsonl(&paths.predictions)?;

    let persisted = PersistedReport {
        split: split_name,
        prefix,
        rows: table.len(),
        config_fingerprint: conf.fingerprint()?,
        generated_at: Utc::now(),
        metrics: &report,
    };
    std::fs::write(&paths.metrics, serde_json::to_string_pretty(&persisted)?)?;

    for (name, value) in report.iter() {
        tracing::info!(prefix, metric = name, %value, "Metric");
    }
    Ok(report)
}
