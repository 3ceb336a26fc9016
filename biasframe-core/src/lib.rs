//! # biasframe-core — offensive-language classification and bias-frame generation evaluation
//!
//! Scores a model that both decides whether a post is offensive and generates
//! the targeted minority group and implied stereotype, against multi-reference
//! human annotations.
//!
//! - [`metrics`] — pure scoring functions (BLEU, ROUGE-L, exact match,
//!   distinct counts, binary F1).
//! - [`report`] — the evaluation table and the registry-driven report builder.
//! - [`pipeline`] — the train → evaluate → persist run around a
//!   [`BiasFrameModel`].

pub mod config;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod training;

pub use config::{DataConfig, MetricsConfig, RunConfig, TrainingConfig, load_config};
pub use data::{Example, NA_TOKEN, Partition, Partitions, Slot};
pub use error::{EvalError, EvalResult};
pub use evaluate::{ReportPaths, evaluate};
pub use model::{BiasFrameModel, Generation, MajorityBaseline, Prediction};
pub use pipeline::{RunSummary, run_experiment};
pub use report::{
    EvaluationRow, EvaluationTable, MetricReport, MetricValue, ReportBuilder, ReportKind, Target,
};
