//! ROUGE-L (longest common subsequence) F-measure.
//!
//! Text is lowercased, every run of characters outside `[a-z0-9]` becomes a
//! token boundary, and no stemming is applied. Each prediction is scored
//! against its best-matching reference; the corpus value is the mean of those
//! per-row F-measures.

use regex::Regex;
use std::sync::LazyLock;

use super::CorpusScorer;
use crate::error::{EvalError, EvalResult};

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("valid regex"));

/// Precision/recall/F of one prediction against one reference.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

impl RougeScore {
    fn from_lcs(lcs: usize, pred_len: usize, ref_len: usize) -> Self {
        if pred_len == 0 || ref_len == 0 || lcs == 0 {
            return Self::default();
        }
        let precision = lcs as f64 / pred_len as f64;
        let recall = lcs as f64 / ref_len as f64;
        Self {
            precision,
            recall,
            fmeasure: 2.0 * precision * recall / (precision + recall),
        }
    }
}

/// ROUGE-L scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RougeL;

impl RougeL {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        NON_ALPHANUMERIC
            .replace_all(&text.to_lowercase(), " ")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Score against the reference with the highest F-measure (first on ties).
    /// An empty reference set scores zero.
    pub fn best_score<S: AsRef<str>>(&self, prediction: &str, references: &[S]) -> RougeScore {
        let pred_tokens = self.tokenize(prediction);
        let mut best: Option<RougeScore> = None;
        for reference in references {
            let ref_tokens = self.tokenize(reference.as_ref());
            let lcs = lcs_len(&pred_tokens, &ref_tokens);
            let score = RougeScore::from_lcs(lcs, pred_tokens.len(), ref_tokens.len());
            if best.is_none_or(|b| score.fmeasure > b.fmeasure) {
                best = Some(score);
            }
        }
        best.unwrap_or_default()
    }

    /// Mean best F-measure across the corpus; 0.0 when empty.
    pub fn corpus_score<S: AsRef<str>>(
        &self,
        predictions: &[&str],
        references: &[Vec<S>],
    ) -> EvalResult<f64> {
        EvalError::check_aligned("ROUGE-L references", predictions.len(), references.len())?;
        if predictions.is_empty() {
            return Ok(0.0);
        }
        let mut per_row: Vec<f64> = predictions
            .iter()
            .zip(references)
            .map(|(pred, refs)| self.best_score(pred, refs).fmeasure)
            .collect();
        // summed in sorted order so the mean does not depend on row order
        per_row.sort_by(f64::total_cmp);
        Ok(per_row.iter().sum::<f64>() / per_row.len() as f64)
    }
}

impl CorpusScorer for RougeL {
    fn name(&self) -> &str {
        "ROUGE-L"
    }

    fn score(&self, predictions: &[&str], references: &[Vec<&str>]) -> EvalResult<f64> {
        self.corpus_score(predictions, references)
    }
}

fn lcs_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_tokenize_normalizes() {
        let rouge = RougeL::new();
        assert_eq!(
            rouge.tokenize("Women's rights, LGBT+ folks!"),
            vec!["women", "s", "rights", "lgbt", "folks"]
        );
        assert!(rouge.tokenize("!!!").is_empty());
    }

    #[test]
    fn test_lcs() {
        assert_eq!(lcs_len(&["a", "b", "c", "d"], &["a", "c", "d"]), 3);
        assert_eq!(lcs_len(&["a"], &["b"]), 0);
        assert_eq!(lcs_len::<&str>(&[], &["b"]), 0);
    }

    #[test]
    fn test_identical_corpus_is_perfect() {
        let preds = ["black folks", "women are weak"];
        let refs = vec![vec!["black folks"], vec!["women are weak"]];
        assert!(approx(RougeL::new().corpus_score(&preds, &refs).unwrap(), 1.0));
    }

    #[test]
    fn test_best_reference_is_chosen() {
        let rouge = RougeL::new();
        let score = rouge.best_score("women are weak", &["men", "women are weak"]);
        assert!(approx(score.fmeasure, 1.0));
    }

    #[test]
    fn test_partial_overlap() {
        // lcs 2, precision 2/3, recall 2/2
        let score = RougeL::new().best_score("women are weak", &["women weak"]);
        assert!(approx(score.precision, 2.0 / 3.0));
        assert!(approx(score.recall, 1.0));
        assert!(approx(score.fmeasure, 0.8));
    }

    #[test]
    fn test_case_insensitive() {
        let score = RougeL::new().best_score("Black Folks", &["black folks"]);
        assert!(approx(score.fmeasure, 1.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        let rouge = RougeL::new();
        assert_eq!(rouge.best_score("women", &[] as &[&str]), RougeScore::default());
        assert_eq!(rouge.best_score("", &["women"]).fmeasure, 0.0);
        let refs: Vec<Vec<&str>> = Vec::new();
        assert_eq!(rouge.corpus_score(&[], &refs).unwrap(), 0.0);
    }

    #[test]
    fn test_corpus_is_mean_of_rows() {
        let preds = ["women", "men"];
        let refs = vec![vec!["women"], vec!["jews"]];
        assert!(approx(RougeL::new().corpus_score(&preds, &refs).unwrap(), 0.5));
    }

    #[test]
    fn test_misaligned() {
        let refs = vec![vec!["a"]];
        assert!(RougeL::new().corpus_score(&["a", "b"], &refs).is_err());
    }
}
