//! Corpus-level BLEU.
//!
//! Statistics are pooled over the whole corpus before the geometric mean and
//! brevity penalty are applied; per-row scores are never averaged. Tokens are
//! whitespace-separated and case-sensitive. No smoothing: a zero clipped count
//! at any n-gram order makes the score 0.0.

use std::collections::HashMap;

use super::CorpusScorer;
use crate::error::{EvalError, EvalResult};

/// BLEU scorer up to `n_gram` with uniform weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bleu {
    pub n_gram: usize,
}

impl Bleu {
    pub fn new(n_gram: usize) -> Self {
        Self {
            n_gram: n_gram.max(1),
        }
    }

    /// BLEU-1: unigram precision with brevity penalty.
    pub fn unigram() -> Self {
        Self::new(1)
    }

    pub fn corpus_score<S: AsRef<str>>(
        &self,
        predictions: &[&str],
        references: &[Vec<S>],
    ) -> EvalResult<f64> {
        EvalError::check_aligned("BLEU references", predictions.len(), references.len())?;

        let n = self.n_gram;
        let mut numerator = vec![0usize; n];
        let mut denominator = vec![0usize; n];
        let mut pred_len = 0usize;
        let mut ref_len = 0usize;

        for (pred, refs) in predictions.iter().zip(references) {
            let pred_tokens: Vec<&str> = pred.split_whitespace().collect();
            let ref_tokens: Vec<Vec<&str>> = refs
                .iter()
                .map(|r| r.as_ref().split_whitespace().collect())
                .collect();

            pred_len += pred_tokens.len();
            // An empty reference set adds no reference length.
            if let Some(closest) = closest_ref_len(pred_tokens.len(), &ref_tokens) {
                ref_len += closest;
            }

            let mut max_ref_counts: HashMap<Vec<&str>, usize> = HashMap::new();
            for tokens in &ref_tokens {
                for (gram, count) in ngram_counts(tokens, n) {
                    let slot = max_ref_counts.entry(gram).or_insert(0);
                    *slot = (*slot).max(count);
                }
            }

            for (gram, count) in ngram_counts(&pred_tokens, n) {
                let order = gram.len() - 1;
                denominator[order] += count;
                if let Some(&ref_count) = max_ref_counts.get(&gram) {
                    numerator[order] += count.min(ref_count);
                }
            }
        }

        if numerator.iter().any(|&clipped| clipped == 0) {
            return Ok(0.0);
        }

        let log_precision = numerator
            .iter()
            .zip(&denominator)
            .map(|(&num, &den)| (num as f64 / den as f64).ln())
            .sum::<f64>()
            / n as f64;

        let brevity_penalty = if pred_len > ref_len {
            1.0
        } else {
            (1.0 - ref_len as f64 / pred_len as f64).exp()
        };

        Ok(brevity_penalty * log_precision.exp())
    }
}

impl Default for Bleu {
    fn default() -> Self {
        Self::unigram()
    }
}

impl CorpusScorer for Bleu {
    fn name(&self) -> &str {
        "BLEU"
    }

    fn score(&self, predictions: &[&str], references: &[Vec<&str>]) -> EvalResult<f64> {
        self.corpus_score(predictions, references)
    }
}

/// Length of the reference closest in length to the prediction; the first one
/// wins ties.
fn closest_ref_len(pred_len: usize, refs: &[Vec<&str>]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for len in refs.iter().map(Vec::len) {
        match best {
            Some(b) if b.abs_diff(pred_len) <= len.abs_diff(pred_len) => {}
            _ => best = Some(len),
        }
    }
    best
}

/// Counts of every n-gram of order 1..=max_n.
fn ngram_counts<'a>(tokens: &[&'a str], max_n: usize) -> HashMap<Vec<&'a str>, usize> {
    let mut counts = HashMap::new();
    for order in 1..=max_n {
        for window in tokens.windows(order) {
            *counts.entry(window.to_vec()).or_insert(0) += 1;
        }
    }
    counts
}
