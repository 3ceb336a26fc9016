//! Property-based tests for the metric library and report builder.

use proptest::prelude::*;

use biasframe_core::metrics::{Bleu, RougeL, distinct_count};
use biasframe_core::{EvaluationRow, EvaluationTable, NA_TOKEN, ReportBuilder, Slot};

fn vocab() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "women",
        "men",
        "black folks",
        "jews",
        "gay men",
        "women are weak",
        "black folks are criminals",
        NA_TOKEN,
    ])
    .prop_map(String::from)
}

fn row() -> impl Strategy<Value = EvaluationRow> {
    (
        0u8..=1,
        0u8..=1,
        prop::collection::vec(vocab(), 0..4),
        vocab(),
        prop::collection::vec(vocab(), 0..4),
        vocab(),
    )
        .prop_map(|(label, pred, groups, group, stereotypes, stereotype)| EvaluationRow {
            offensive_label: label,
            offensive_prediction: pred,
            reference_minority_groups: groups.into_iter().map(Slot::from).collect(),
            generated_minority_group: Slot::from(group),
            reference_stereotypes: stereotypes.into_iter().map(Slot::from).collect(),
            generated_stereotype: Slot::from(stereotype),
        })
}

fn rows_and_permutation() -> impl Strategy<Value = (Vec<EvaluationRow>, Vec<EvaluationRow>)> {
    prop::collection::vec(row(), 0..24)
        .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
}

// --- Classification properties ---

proptest! {
    #[test]
    fn accuracy_is_exact_fraction(rows in prop::collection::vec(row(), 1..40)) {
        let agree = rows
            .iter()
            .filter(|r| r.offensive_label == r.offensive_prediction)
            .count();
        let expected = agree as f64 / rows.len() as f64;
        let table = EvaluationTable::new(rows).unwrap();
        let report = ReportBuilder::default().classification_report(&table).unwrap();
        let accuracy = report.score("offensive-accuracy").unwrap();
        prop_assert!((0.0..=1.0).contains(&accuracy));
        prop_assert_eq!(accuracy, expected);
        let f1 = report.score("offensive-F1").unwrap();
        prop_assert!((0.0..=1.0).contains(&f1));
    }
}

// --- Report-level properties ---

proptest! {
    #[test]
    fn report_is_idempotent(rows in prop::collection::vec(row(), 0..24)) {
        let table = EvaluationTable::new(rows).unwrap();
        let before = table.clone();
        let builder = ReportBuilder::default();
        let first = builder.full_report(&table).unwrap();
        let second = builder.full_report(&table).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(table, before);
    }

    #[test]
    fn report_is_row_order_invariant((rows, shuffled) in rows_and_permutation()) {
        let builder = ReportBuilder::default();
        let original = builder.full_report(&EvaluationTable::new(rows).unwrap()).unwrap();
        let permuted = builder.full_report(&EvaluationTable::new(shuffled).unwrap()).unwrap();
        prop_assert_eq!(original, permuted);
    }

    #[test]
    fn scores_stay_in_unit_interval(rows in prop::collection::vec(row(), 0..24)) {
        let report = ReportBuilder::default()
            .full_report(&EvaluationTable::new(rows).unwrap())
            .unwrap();
        for (name, value) in report.iter() {
            if !name.starts_with("distinct-") {
                let v = value.as_f64();
                prop_assert!((0.0..=1.0 + 1e-12).contains(&v), "{} = {}", name, v);
            }
        }
    }
}

// --- Distinctness properties ---

proptest! {
    #[test]
    fn distinct_never_counts_na(values in prop::collection::vec(vocab(), 0..30)) {
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let with_na = distinct_count(refs.iter().copied(), NA_TOKEN);
        let mut unique: Vec<&str> = refs.iter().copied().filter(|v| *v != NA_TOKEN).collect();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(with_na, unique.len());
    }
}

// --- Overlap metric properties ---

proptest! {
    #[test]
    fn identical_corpus_scores_one(
        sentences in prop::collection::vec("[a-z]{1,8}( [a-z]{1,8}){0,3}", 1..12)
    ) {
        let preds: Vec<&str> = sentences.iter().map(String::as_str).collect();
        let refs: Vec<Vec<&str>> = preds.iter().map(|p| vec![*p]).collect();
        let bleu = Bleu::unigram().corpus_score(&preds, &refs).unwrap();
        let rouge = RougeL::new().corpus_score(&preds, &refs).unwrap();
        prop_assert!((bleu - 1.0).abs() < 1e-9);
        prop_assert!((rouge - 1.0).abs() < 1e-9);
    }

    #[test]
    fn misaligned_corpora_always_error(
        preds in prop::collection::vec("[a-z]{1,6}", 0..8),
        extra in 1usize..4,
    ) {
        let pred_refs: Vec<&str> = preds.iter().map(String::as_str).collect();
        let refs: Vec<Vec<&str>> = vec![vec!["x"]; preds.len() + extra];
        prop_assert!(Bleu::unigram().corpus_score(&pred_refs, &refs).is_err());
        prop_assert!(RougeL::new().corpus_score(&pred_refs, &refs).is_err());
    }
}
