//! Set-membership and distinctness metrics over generated text.

use std::collections::HashSet;

use crate::data::Slot;
use crate::error::{EvalError, EvalResult};

/// True iff `generated` is one of `references`. Raw string equality: no
/// trimming, no case folding.
pub fn exact_match<S: AsRef<str>>(generated: &str, references: &[S]) -> bool {
    references.iter().any(|r| r.as_ref() == generated)
}

/// Proportion of rows whose generation is a member of that row's references.
/// 0.0 for an empty corpus.
pub fn exact_match_rate<S: AsRef<str>>(generated: &[&str], references: &[Vec<S>]) -> EvalResult<f64> {
    EvalError::check_aligned("exact-match references", generated.len(), references.len())?;
    if generated.is_empty() {
        return Ok(0.0);
    }
    let hits = generated
        .iter()
        .zip(references)
        .filter(|(g, refs)| exact_match(g, refs))
        .count();
    Ok(hits as f64 / generated.len() as f64)
}

/// Number of distinct values once every occurrence of `excluding` is removed.
pub fn distinct_count<'a, I>(values: I, excluding: &str) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .filter(|v| *v != excluding)
        .collect::<HashSet<_>>()
        .len()
}

/// Number of distinct applicable slot values; not-applicable slots are skipped.
pub fn distinct_applicable<'a, I>(slots: I) -> usize
where
    I: IntoIterator<Item = &'a Slot>,
{
    slots
        .into_iter()
        .filter_map(Slot::applicable)
        .collect::<HashSet<_>>()
        .len()
}
