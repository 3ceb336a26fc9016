//! Run configuration.
//!
//! Uses `figment` for layered configuration: built-in base -> YAML config file ->
//! `BIASFRAME_` environment variables. Nested sections are deep-merged, so keys
//! absent from the config file keep their base values.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::{EvalError, EvalResult};

/// Name of the resolved configuration dump inside `output_dir`.
pub const CONFIG_DUMP_FILE: &str = "config.yaml";

/// Top-level configuration for one experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory receiving the config dump, reports, predictions, and logs.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Process-wide seed, applied once at start.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub data_config: DataConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            seed: default_seed(),
            training: TrainingConfig::default(),
            data_config: DataConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_seed() -> u64 {
    42
}

/// Fit-loop settings consumed by the training runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// Rows per batch, for both training and inference.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Epochs without dev F1 improvement before stopping.
    #[serde(default = "default_patience")]
    pub early_stopping_patience: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            early_stopping_patience: default_patience(),
        }
    }
}

fn default_epochs() -> usize {
    3
}

fn default_batch_size() -> usize {
    32
}

fn default_patience() -> usize {
    2
}

/// Partition layout. Each partition name resolves to `{data_dir}/{name}.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_train")]
    pub train: String,
    #[serde(default = "default_dev")]
    pub dev: String,
    #[serde(default = "default_test")]
    pub test: String,
    /// Extra partitions evaluated after `test`, each under its own prefix.
    #[serde(default)]
    pub additional_test: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            train: default_train(),
            dev: default_dev(),
            test: default_test(),
            additional_test: Vec::new(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_train() -> String {
    "train".to_string()
}

fn default_dev() -> String {
    "dev".to_string()
}

fn default_test() -> String {
    "test".to_string()
}

/// Corpus scorer settings for the report builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Highest n-gram order for the BLEU scorer.
    #[serde(default = "default_bleu_n_gram")]
    pub bleu_n_gram: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            bleu_n_gram: default_bleu_n_gram(),
        }
    }
}

fn default_bleu_n_gram() -> usize {
    1
}

impl DataConfig {
    pub fn partition_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.jsonl"))
    }

    /// Every partition the run needs, deduplicated, in load order.
    pub fn partition_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let core = [
            self.train.as_str(),
            self.dev.as_str(),
            self.test.as_str(),
        ];
        for name in core
            .into_iter()
            .chain(self.additional_test.iter().map(String::as_str))
        {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl RunConfig {
    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> EvalResult<()> {
        if self.training.batch_size == 0 {
            return Err(EvalError::config("training.batch_size must be positive"));
        }
        if self.metrics.bleu_n_gram == 0 {
            return Err(EvalError::config("metrics.bleu_n_gram must be at least 1"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(EvalError::config("output_dir must not be empty"));
        }
        Ok(())
    }

    /// Serialize the resolved configuration to `{output_dir}/config.yaml`,
    /// creating the directory if needed.
    pub fn dump(&self) -> EvalResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(CONFIG_DUMP_FILE);
        std::fs::write(&path, serde_yaml::to_string(self)?)?;
        Ok(path)
    }

    /// SHA-256 over the canonical JSON form of the resolved config.
    pub fn fingerprint(&self) -> EvalResult<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(format!("{:x}", Sha256::digest(&canonical)))
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`BIASFRAME_TRAINING__EPOCHS`, ...)
/// 2. The YAML file at `path`
/// 3. Built-in base configuration
///
/// A missing file is an error rather than an empty layer.
pub fn load_config(path: &Path) -> EvalResult<RunConfig> {
    if !path.is_file() {
        return Err(EvalError::config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let config: RunConfig = Figment::from(Serialized::defaults(RunConfig::default()))
        .merge(Yaml::file(path))
        .merge(Env::prefixed("BIASFRAME_").split("__"))
        .extract()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let conf = RunConfig::default();
        assert_eq!(conf.seed, 42);
        assert_eq!(conf.training.batch_size, 32);
        assert!(conf.data_config.additional_test.is_empty());
    }

    #[test]
    fn test_load_merges_over_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exp.yaml");
        std::fs::write(
            &path,
            "output_dir: runs/exp1\ntraining:\n  epochs: 7\ndata_config:\n  additional_test: [implicit, gab]\n",
        )
        .unwrap();

        let conf = load_config(&path).unwrap();
        assert_eq!(conf.output_dir, PathBuf::from("runs/exp1"));
        assert_eq!(conf.training.epochs, 7);
        // untouched keys of a partially-overridden section keep base values
        assert_eq!(conf.training.batch_size, 32);
        assert_eq!(conf.data_config.test, "test");
        assert_eq!(
            conf.data_config.additional_test,
            vec!["implicit".to_string(), "gab".to_string()]
        );
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_config(Path::new("/nonexistent/biasframe.yaml")).unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "training:\n  epochs: [not, a, number]\n").unwrap();
        assert!(matches!(load_config(&path), Err(EvalError::Config(_))));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut conf = RunConfig::default();
        conf.training.batch_size = 0;
        assert!(conf.validate().is_err());
    }

    #[test]
    fn test_metrics_section_merges_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exp.yaml");

        std::fs::write(&path, "seed: 7\n").unwrap();
        assert_eq!(load_config(&path).unwrap().metrics.bleu_n_gram, 1);

        std::fs::write(&path, "metrics:\n  bleu_n_gram: 2\n").unwrap();
        assert_eq!(load_config(&path).unwrap().metrics.bleu_n_gram, 2);

        std::fs::write(&path, "metrics:\n  bleu_n_gram: 0\n").unwrap();
        assert!(matches!(load_config(&path), Err(EvalError::Config(_))));
    }

    #[test]
    fn test_partition_names_dedup() {
        let mut data = DataConfig::default();
        data.additional_test = vec!["test".into(), "implicit".into()];
        assert_eq!(data.partition_names(), vec!["train", "dev", "test", "implicit"]);
        assert_eq!(
            data.partition_path("implicit"),
            PathBuf::from("data/implicit.jsonl")
        );
    }

    #[test]
    fn test_dump_round_trips_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let mut conf = RunConfig::default();
        conf.output_dir = dir.path().join("nested/out");
        let path = conf.dump().unwrap();
        assert!(path.ends_with(CONFIG_DUMP_FILE));
        let reloaded: RunConfig =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded, conf);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let conf = RunConfig::default();
        assert_eq!(conf.fingerprint().unwrap(), conf.fingerprint().unwrap());
        let mut other = conf.clone();
        other.seed = 7;
        assert_ne!(conf.fingerprint().unwrap(), other.fingerprint().unwrap());
    }
}
