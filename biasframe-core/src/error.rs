//! Error types for the biasframe-core crate.

use thiserror::Error;

/// Result alias used across the crate.
pub type EvalResult<T> = Result<T, EvalError>;

/// Top-level error type for evaluation runs.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two sequences that must be zipped row-by-row have different lengths.
    #[error("Alignment error in {context}: expected {expected} rows, got {actual}")]
    Alignment {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl EvalError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Fails with an alignment error unless `actual == expected`.
    pub fn check_aligned(context: &str, expected: usize, actual: usize) -> EvalResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::Alignment {
                context: context.to_string(),
                expected,
                actual,
            })
        }
    }
}

impl From<figment::Error> for EvalError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_aligned() {
        assert!(EvalError::check_aligned("bleu", 3, 3).is_ok());
        let err = EvalError::check_aligned("bleu", 3, 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Alignment error in bleu: expected 3 rows, got 2"
        );
    }
}
