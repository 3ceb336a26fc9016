//! Metric library — pure scoring functions over aligned prediction/reference
//! sequences.

pub mod bleu;
pub mod classification;
pub mod rouge;
pub mod text;

pub use bleu::Bleu;
pub use classification::BinaryConfusion;
pub use rouge::{RougeL, RougeScore};
pub use text::{distinct_applicable, distinct_count, exact_match, exact_match_rate};

use crate::error::EvalResult;

/// A corpus-level text-generation metric.
///
/// Implementations hold no mutable state, so one value can score any number
/// of corpora. `references[i]` is the set of acceptable strings for
/// `predictions[i]`; mismatched lengths are an alignment error.
pub trait CorpusScorer {
    fn name(&self) -> &str;
    fn score(&self, predictions: &[&str], references: &[Vec<&str>]) -> EvalResult<f64>;
}

/// BLEU-1 over the whole corpus.
pub fn bleu1(predictions: &[&str], references: &[Vec<&str>]) -> EvalResult<f64> {
    Bleu::unigram().corpus_score(predictions, references)
}

/// ROUGE-L F-measure over the whole corpus.
pub fn rouge_l(predictions: &[&str], references: &[Vec<&str>]) -> EvalResult<f64> {
    RougeL::new().corpus_score(predictions, references)
}
