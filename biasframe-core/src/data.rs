//! Annotated examples, generation slots, and partition loading.
//!
//! Partitions are pre-split JSONL files, one annotated post per line:
//!
//! ```json
//! {"post": "...", "offensiveYN": 1, "referenceMinorityGroups": ["women"], "referenceStereotypes": ["women are weak"]}
//! ```

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::DataConfig;
use crate::error::{EvalError, EvalResult};

/// Reserved text meaning "no group/stereotype applies".
pub const NA_TOKEN: &str = "none";

/// A generated or reference value for one generation target.
///
/// The not-applicable case is its own variant; it only becomes [`NA_TOKEN`]
/// when rendered as text for overlap scoring or serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Slot {
    Applicable(String),
    NotApplicable,
}

impl Slot {
    pub fn new(text: impl Into<String>) -> Self {
        Self::from(text.into())
    }

    /// Text form used by exact-match and overlap scoring.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Applicable(text) => text,
            Self::NotApplicable => NA_TOKEN,
        }
    }

    pub fn applicable(&self) -> Option<&str> {
        match self {
            Self::Applicable(text) => Some(text),
            Self::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Applicable(_))
    }
}

impl From<String> for Slot {
    fn from(text: String) -> Self {
        if text == NA_TOKEN {
            Self::NotApplicable
        } else {
            Self::Applicable(text)
        }
    }
}

impl From<&str> for Slot {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl From<Slot> for String {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Applicable(text) => text,
            Slot::NotApplicable => NA_TOKEN.to_string(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One annotated post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    #[serde(default)]
    pub post: String,
    #[serde(rename = "offensiveYN")]
    pub offensive_label: u8,
    #[serde(rename = "referenceMinorityGroups", default)]
    pub reference_minority_groups: Vec<Slot>,
    #[serde(rename = "referenceStereotypes", default)]
    pub reference_stereotypes: Vec<Slot>,
}

/// Ensure a class value is 0 or 1.
pub fn check_binary(value: u8, what: &str) -> EvalResult<u8> {
    if value <= 1 {
        Ok(value)
    } else {
        Err(EvalError::invalid_input(format!(
            "{what} must be 0 or 1, got {value}"
        )))
    }
}

/// A named slice of the annotated data.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub name: String,
    pub examples: Vec<Example>,
}

impl Partition {
    pub fn new(name: impl Into<String>, examples: Vec<Example>) -> Self {
        Self {
            name: name.into(),
            examples,
        }
    }

    /// Read a JSONL partition file. Blank lines are skipped.
    pub fn load(name: &str, path: &Path) -> EvalResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            EvalError::dataset(format!(
                "cannot open partition '{name}' at {}: {e}",
                path.display()
            ))
        })?;

        let mut examples = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let example: Example = serde_json::from_str(&line).map_err(|e| {
                EvalError::dataset(format!("{}:{}: {e}", path.display(), idx + 1))
            })?;
            check_binary(example.offensive_label, "offensiveYN").map_err(|e| {
                EvalError::dataset(format!("{}:{}: {e}", path.display(), idx + 1))
            })?;
            examples.push(example);
        }

        tracing::debug!(partition = name, rows = examples.len(), "Loaded partition");
        Ok(Self::new(name, examples))
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Row-order batches for inference.
    pub fn batches(&self, batch_size: usize) -> std::slice::Chunks<'_, Example> {
        self.examples.chunks(batch_size.max(1))
    }

    /// A freshly shuffled copy of the rows, for one training epoch.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Example> {
        let mut rows = self.examples.clone();
        rows.shuffle(rng);
        rows
    }
}

/// Every partition a run needs, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Partitions {
    by_name: BTreeMap<String, Partition>,
}

impl Partitions {
    /// Load train/dev/test and every additional test partition.
    pub fn prepare(conf: &DataConfig) -> EvalResult<Self> {
        let mut by_name = BTreeMap::new();
        for name in conf.partition_names() {
            let partition = Partition::load(name, &conf.partition_path(name))?;
            by_name.insert(name.to_string(), partition);
        }
        Ok(Self { by_name })
    }

    pub fn get(&self, name: &str) -> EvalResult<&Partition> {
        self.by_name
            .get(name)
            .ok_or_else(|| EvalError::dataset(format!("unknown partition '{name}'")))
    }
}
