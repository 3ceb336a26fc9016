//! The model seam: what the orchestrator needs from a joint
//! classifier/generator, plus a frequency baseline implementing it.

use std::collections::BTreeMap;

use crate::data::{Example, Slot, check_binary};
use crate::error::{EvalError, EvalResult};

/// Generated free text for one example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub minority_group: Slot,
    pub stereotype: Slot,
}

impl Generation {
    pub fn not_applicable() -> Self {
        Self {
            minority_group: Slot::NotApplicable,
            stereotype: Slot::NotApplicable,
        }
    }
}

/// Full model output for one example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub offensive: u8,
    pub minority_group: Slot,
    pub stereotype: Slot,
}

/// A model that decides offensiveness and generates the targeted group and
/// implied stereotype. Batches are slices of a partition in row order; every
/// output vector must have exactly one entry per input row.
pub trait BiasFrameModel {
    fn name(&self) -> &str;

    /// One optimization step over `batch`; returns the batch loss.
    fn fit_batch(&mut self, batch: &[Example]) -> EvalResult<f64>;

    /// Thresholded binary decisions.
    fn classify(&self, batch: &[Example]) -> EvalResult<Vec<u8>>;

    /// Generations, conditioned on the row's offensive decision.
    fn generate(&self, batch: &[Example], offensive: &[u8]) -> EvalResult<Vec<Generation>>;

    /// Classify then generate, checking that both outputs line up with `batch`.
    fn predict(&self, batch: &[Example]) -> EvalResult<Vec<Prediction>> {
        let offensive = self.classify(batch)?;
        EvalError::check_aligned("model classifications", batch.len(), offensive.len())?;
        for &decision in &offensive {
            check_binary(decision, "offensive prediction")?;
        }
        let generations = self.generate(batch, &offensive)?;
        EvalError::check_aligned("model generations", batch.len(), generations.len())?;

        Ok(offensive
            .into_iter()
            .zip(generations)
            .map(|(offensive, g)| Prediction {
                offensive,
                minority_group: g.minority_group,
                stereotype: g.stereotype,
            })
            .collect())
    }
}

/// Predicts the majority label, and for offensive rows the most frequent
/// applicable reference group and stereotype seen during fitting.
#[derive(Debug, Clone, Default)]
pub struct MajorityBaseline {
    label_counts: [usize; 2],
    group_counts: BTreeMap<String, usize>,
    stereotype_counts: BTreeMap<String, usize>,
}

impl MajorityBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn majority_label(&self) -> u8 {
        u8::from(self.label_counts[1] > self.label_counts[0])
    }

    pub fn top_group(&self) -> Slot {
        most_frequent(&self.group_counts)
    }

    pub fn top_stereotype(&self) -> Slot {
        most_frequent(&self.stereotype_counts)
    }
}

/// Highest count wins; ties go to the lexicographically smallest value.
fn most_frequent(counts: &BTreeMap<String, usize>) -> Slot {
    let mut best: Option<(&String, usize)> = None;
    for (value, &count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    match best {
        Some((value, _)) => Slot::Applicable(value.clone()),
        None => Slot::NotApplicable,
    }
}

impl BiasFrameModel for MajorityBaseline {
    fn name(&self) -> &str {
        "majority-baseline"
    }

    fn fit_batch(&mut self, batch: &[Example]) -> EvalResult<f64> {
        if batch.is_empty() {
            return Ok(0.0);
        }
        for example in batch {
            let label = check_binary(example.offensive_label, "offensiveYN")?;
            self.label_counts[label as usize] += 1;
            for group in example.reference_minority_groups.iter().filter_map(Slot::applicable) {
                *self.group_counts.entry(group.to_string()).or_insert(0) += 1;
            }
            for stereotype in example.reference_stereotypes.iter().filter_map(Slot::applicable) {
                *self.stereotype_counts.entry(stereotype.to_string()).or_insert(0) += 1;
            }
        }

        // 0/1 loss of the updated majority decision on this batch
        let majority = self.majority_label();
        let misses = batch
            .iter()
            .filter(|e| e.offensive_label != majority)
            .count();
        Ok(misses as f64 / batch.len() as f64)
    }

    fn classify(&self, batch: &[Example]) -> EvalResult<Vec<u8>> {
        Ok(vec![self.majority_label(); batch.len()])
    }

    fn generate(&self, batch: &[Example], offensive: &[u8]) -> EvalResult<Vec<Generation>> {
        EvalError::check_aligned("generation conditioning", batch.len(), offensive.len())?;
        let group = self.top_group();
        let stereotype = self.top_stereotype();
        Ok(offensive
            .iter()
            .map(|&decision| {
                if decision == 1 {
                    Generation {
                        minority_group: group.clone(),
                        stereotype: stereotype.clone(),
                    }
                } else {
                    Generation::not_applicable()
                }
            })
            .collect())
    }
}
