//! Report builder — turns one evaluation table into a flat metric report.
//!
//! The metric vocabulary is a static registry of [`MetricSpec`] entries; the
//! aggregation loop only walks the registry, so adding a metric means adding
//! an entry.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data::{Example, Slot, check_binary};
use crate::error::{EvalError, EvalResult};
use crate::metrics::{
    BinaryConfusion, Bleu, CorpusScorer, RougeL, distinct_applicable, exact_match_rate,
};
use crate::model::Prediction;

/// A generation target scored against multi-reference annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    MinorityGroup,
    Stereotype,
}

/// One labeled example after inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    #[serde(rename = "offensiveYN")]
    pub offensive_label: u8,
    #[serde(rename = "offensivePrediction")]
    pub offensive_prediction: u8,
    #[serde(rename = "referenceMinorityGroups")]
    pub reference_minority_groups: Vec<Slot>,
    #[serde(rename = "generatedMinorityGroup")]
    pub generated_minority_group: Slot,
    #[serde(rename = "referenceStereotypes")]
    pub reference_stereotypes: Vec<Slot>,
    #[serde(rename = "generatedStereotype")]
    pub generated_stereotype: Slot,
}

impl EvaluationRow {
    pub fn generated(&self, target: Target) -> &Slot {
        match target {
            Target::MinorityGroup => &self.generated_minority_group,
            Target::Stereotype => &self.generated_stereotype,
        }
    }

    pub fn references(&self, target: Target) -> &[Slot] {
        match target {
            Target::MinorityGroup => &self.reference_minority_groups,
            Target::Stereotype => &self.reference_stereotypes,
        }
    }
}

/// Rows in evaluation order. Every per-row metric pairs row `i`'s outputs
/// with row `i`'s references only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationTable {
    rows: Vec<EvaluationRow>,
}

impl EvaluationTable {
    pub fn new(rows: Vec<EvaluationRow>) -> EvalResult<Self> {
        for row in &rows {
            check_binary(row.offensive_label, "offensiveYN")?;
            check_binary(row.offensive_prediction, "offensivePrediction")?;
        }
        Ok(Self { rows })
    }

    /// Join a partition's examples with the model's predictions, row by row.
    pub fn from_predictions(examples: &[Example], predictions: Vec<Prediction>) -> EvalResult<Self> {
        EvalError::check_aligned("predictions", examples.len(), predictions.len())?;
        let rows = examples
            .iter()
            .zip(predictions)
            .map(|(example, pred)| EvaluationRow {
                offensive_label: example.offensive_label,
                offensive_prediction: pred.offensive,
                reference_minority_groups: example.reference_minority_groups.clone(),
                generated_minority_group: pred.minority_group,
                reference_stereotypes: example.reference_stereotypes.clone(),
                generated_stereotype: pred.stereotype,
            })
            .collect();
        Self::new(rows)
    }

    /// Table for a classification-only pass: generation was skipped, so both
    /// generated columns hold the not-applicable slot.
    pub fn from_classifications(examples: &[Example], offensive: &[u8]) -> EvalResult<Self> {
        let predictions = offensive
            .iter()
            .map(|&decision| Prediction {
                offensive: decision,
                minority_group: Slot::NotApplicable,
                stereotype: Slot::NotApplicable,
            })
            .collect();
        Self::from_predictions(examples, predictions)
    }

    pub fn rows(&self) -> &[EvaluationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.offensive_label).collect()
    }

    pub fn offensive_predictions(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.offensive_prediction).collect()
    }

    pub fn confusion(&self) -> EvalResult<BinaryConfusion> {
        BinaryConfusion::from_columns(&self.labels(), &self.offensive_predictions())
    }

    /// Generated column of `target` as scoring text.
    pub fn generated_text(&self, target: Target) -> Vec<&str> {
        self.rows.iter().map(|r| r.generated(target).as_str()).collect()
    }

    /// Reference sets of `target` as scoring text, aligned with
    /// [`generated_text`](Self::generated_text).
    pub fn reference_text(&self, target: Target) -> Vec<Vec<&str>> {
        self.rows
            .iter()
            .map(|r| r.references(target).iter().map(Slot::as_str).collect())
            .collect()
    }

    pub fn generated_slots(&self, target: Target) -> impl Iterator<Item = &Slot> {
        self.rows.iter().map(move |r| r.generated(target))
    }

    /// Every reference slot of `target`, flattened across rows.
    pub fn reference_slots(&self, target: Target) -> impl Iterator<Item = &Slot> {
        self.rows.iter().flat_map(move |r| r.references(target))
    }

    /// Write one JSON row per line to `path`, replacing any existing file.
    pub fn write_jsonl(&self, path: &Path) -> EvalResult<()> {
        let mut out = BufWriter::new(std::fs::File::create(path)?);
        for row in &self.rows {
            serde_json::to_writer(&mut out, row)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}

/// A report value: a score in `[0, 1]` or a distinct-value count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(usize),
    Score(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Score(v) => *v,
            MetricValue::Count(c) => *c as f64,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Score(v) => write!(f, "{v:.4}"),
            MetricValue::Count(c) => write!(f, "{c}"),
        }
    }
}

/// Computes one metric from a table with the builder's scorers.
pub type MetricFn = fn(&EvaluationTable, &ReportBuilder) -> EvalResult<MetricValue>;

/// One registry entry: metric name plus its computation.
#[derive(Clone, Copy)]
pub struct MetricSpec {
    pub name: &'static str,
    pub compute: MetricFn,
}

impl fmt::Debug for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSpec").field("name", &self.name).finish()
    }
}

fn exact_match_of(table: &EvaluationTable, target: Target) -> EvalResult<MetricValue> {
    let score = exact_match_rate(&table.generated_text(target), &table.reference_text(target))?;
    Ok(MetricValue::Score(score))
}

fn overlap_of(
    table: &EvaluationTable,
    target: Target,
    scorer: &dyn CorpusScorer,
) -> EvalResult<MetricValue> {
    let score = scorer.score(&table.generated_text(target), &table.reference_text(target))?;
    Ok(MetricValue::Score(score))
}

/// Classification metrics, shared by both report kinds.
pub const CLASSIFICATION_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "offensive-accuracy",
        compute: |t, _| Ok(MetricValue::Score(t.confusion()?.accuracy())),
    },
    MetricSpec {
        name: "offensive-F1",
        compute: |t, _| Ok(MetricValue::Score(t.confusion()?.f1())),
    },
];

/// Generation and distinctness metrics, full report only.
pub const GENERATION_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "minority-group-exact-match",
        compute: |t, _| exact_match_of(t, Target::MinorityGroup),
    },
    MetricSpec {
        name: "minority-group-BLEU-1",
        compute: |t, b| overlap_of(t, Target::MinorityGroup, b.bleu.as_ref()),
    },
    MetricSpec {
        name: "minority-group-ROUGE-L",
        compute: |t, b| overlap_of(t, Target::MinorityGroup, b.rouge.as_ref()),
    },
    MetricSpec {
        name: "stereotype-exact-match",
        compute: |t, _| exact_match_of(t, Target::Stereotype),
    },
    MetricSpec {
        name: "stereotype-BLEU-1",
        compute: |t, b| overlap_of(t, Target::Stereotype, b.bleu.as_ref()),
    },
    MetricSpec {
        name: "stereotype-ROUGE-L",
        compute: |t, b| overlap_of(t, Target::Stereotype, b.rouge.as_ref()),
    },
    MetricSpec {
        name: "distinct-minority-groups",
        compute: |t, _| {
            Ok(MetricValue::Count(distinct_applicable(
                t.reference_slots(Target::MinorityGroup),
            )))
        },
    },
    MetricSpec {
        name: "distinct-minority-groups-generated",
        compute: |t, _| {
            Ok(MetricValue::Count(distinct_applicable(
                t.generated_slots(Target::MinorityGroup),
            )))
        },
    },
    MetricSpec {
        name: "distinct-stereotypes",
        compute: |t, _| {
            Ok(MetricValue::Count(distinct_applicable(
                t.reference_slots(Target::Stereotype),
            )))
        },
    },
    MetricSpec {
        name: "distinct-stereotypes-generated",
        compute: |t, _| {
            Ok(MetricValue::Count(distinct_applicable(
                t.generated_slots(Target::Stereotype),
            )))
        },
    },
];

/// Which vocabulary a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Full,
    ClassificationOnly,
}

impl ReportKind {
    pub fn specs(&self) -> impl Iterator<Item = &'static MetricSpec> {
        let generation: &'static [MetricSpec] = match self {
            ReportKind::Full => GENERATION_METRICS,
            ReportKind::ClassificationOnly => &[],
        };
        CLASSIFICATION_METRICS.iter().chain(generation)
    }
}

/// Flat name → value summary of one evaluation pass, in vocabulary order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReport {
    kind: ReportKind,
    values: Vec<(&'static str, MetricValue)>,
}

impl MetricReport {
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn score(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| v.as_f64())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, MetricValue)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Aligned two-column text table.
    pub fn format(&self) -> String {
        let width = self.values.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        self.values
            .iter()
            .map(|(name, value)| format!("{name:<width$}  {value}\n"))
            .collect()
    }
}

impl Serialize for MetricReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Builds reports with explicitly supplied corpus scorers.
pub struct ReportBuilder {
    bleu: Box<dyn CorpusScorer>,
    rouge: Box<dyn CorpusScorer>,
}

impl ReportBuilder {
    pub fn new(bleu: impl CorpusScorer + 'static, rouge: impl CorpusScorer + 'static) -> Self {
        Self {
            bleu: Box::new(bleu),
            rouge: Box::new(rouge),
        }
    }

    /// Classification, exact-match, BLEU-1, ROUGE-L, and distinctness metrics.
    pub fn full_report(&self, table: &EvaluationTable) -> EvalResult<MetricReport> {
        self.build(table, ReportKind::Full)
    }

    /// Accuracy and F1 only.
    pub fn classification_report(&self, table: &EvaluationTable) -> EvalResult<MetricReport> {
        self.build(table, ReportKind::ClassificationOnly)
    }

    pub fn build(&self, table: &EvaluationTable, kind: ReportKind) -> EvalResult<MetricReport> {
        let values = kind
            .specs()
            .map(|spec| Ok((spec.name, (spec.compute)(table, self)?)))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(MetricReport { kind, values })
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(Bleu::unigram(), RougeL::new())
    }
}

impl fmt::Debug for ReportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportBuilder")
            .field("bleu", &self.bleu.name())
            .field("rouge", &self.rouge.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NA_TOKEN;
    use pretty_assertions::assert_eq;

    fn stereotype_of(group: &str) -> Slot {
        match Slot::new(group) {
            Slot::Applicable(g) => Slot::new(format!("{g} are bad")),
            Slot::NotApplicable => Slot::NotApplicable,
        }
    }

    fn row(label: u8, pred: u8, refs: &[&str], generated: &str) -> EvaluationRow {
        EvaluationRow {
            offensive_label: label,
            offensive_prediction: pred,
            reference_minority_groups: refs.iter().map(|r| Slot::new(*r)).collect(),
            generated_minority_group: Slot::new(generated),
            reference_stereotypes: refs.iter().map(|r| stereotype_of(r)).collect(),
            generated_stereotype: stereotype_of(generated),
        }
    }

    fn sample_table() -> EvaluationTable {
        EvaluationTable::new(vec![
            row(1, 1, &["women", "girls"], "women"),
            row(0, 1, &[NA_TOKEN], NA_TOKEN),
            row(1, 1, &["women"], "women"),
            row(0, 0, &[NA_TOKEN], "men"),
        ])
        .unwrap()
    }

    #[test]
    fn test_full_vocabulary_order() {
        let report = ReportBuilder::default().full_report(&sample_table()).unwrap();
        let names: Vec<_> = report.iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "offensive-accuracy",
                "offensive-F1",
                "minority-group-exact-match",
                "minority-group-BLEU-1",
                "minority-group-ROUGE-L",
                "stereotype-exact-match",
                "stereotype-BLEU-1",
                "stereotype-ROUGE-L",
                "distinct-minority-groups",
                "distinct-minority-groups-generated",
                "distinct-stereotypes",
                "distinct-stereotypes-generated",
            ]
        );
    }

    #[test]
    fn test_full_report_values() {
        let report = ReportBuilder::default().full_report(&sample_table()).unwrap();
        assert_eq!(report.get("offensive-accuracy"), Some(MetricValue::Score(0.75)));
        assert_eq!(report.get("offensive-F1"), Some(MetricValue::Score(0.8)));
        // NA generation matching an NA reference counts as a match
        assert_eq!(
            report.get("minority-group-exact-match"),
            Some(MetricValue::Score(0.75))
        );
        assert_eq!(report.get("distinct-minority-groups"), Some(MetricValue::Count(2)));
        assert_eq!(
            report.get("distinct-minority-groups-generated"),
            Some(MetricValue::Count(2))
        );
        assert_eq!(report.get("distinct-stereotypes"), Some(MetricValue::Count(2)));
        assert_eq!(
            report.get("distinct-stereotypes-generated"),
            Some(MetricValue::Count(2))
        );
        assert_eq!(report.score("stereotype-exact-match"), Some(0.75));
    }

    #[test]
    fn test_classification_report_is_subset() {
        let table = sample_table();
        let builder = ReportBuilder::default();
        let small = builder.classification_report(&table).unwrap();
        let full = builder.full_report(&table).unwrap();
        assert_eq!(small.len(), 2);
        assert_eq!(small.kind(), ReportKind::ClassificationOnly);
        assert_eq!(full.kind(), ReportKind::Full);
        for (name, value) in small.iter() {
            assert_eq!(full.get(name), Some(value));
        }
    }

    #[test]
    fn test_empty_table_is_degenerate_not_error() {
        let report = ReportBuilder::default()
            .full_report(&EvaluationTable::default())
            .unwrap();
        assert_eq!(report.len(), 12);
        for (name, value) in report.iter() {
            assert_eq!(value.as_f64(), 0.0, "{name}");
        }
    }

    #[test]
    fn test_all_na_references() {
        let table = EvaluationTable::new(vec![row(0, 0, &[NA_TOKEN], NA_TOKEN)]).unwrap();
        let report = ReportBuilder::default().full_report(&table).unwrap();
        assert_eq!(report.get("distinct-minority-groups"), Some(MetricValue::Count(0)));
        assert_eq!(
            report.get("distinct-minority-groups-generated"),
            Some(MetricValue::Count(0))
        );
        assert_eq!(report.score("minority-group-BLEU-1"), Some(1.0));
    }

    #[test]
    fn test_report_serializes_in_order() {
        let report = ReportBuilder::default()
            .classification_report(&sample_table())
            .unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"offensive-accuracy":0.75,"offensive-F1":0.8}"#);
    }

    #[test]
    fn test_format() {
        let report = ReportBuilder::default()
            .classification_report(&sample_table())
            .unwrap();
        assert_eq!(
            report.format(),
            "offensive-accuracy  0.7500\noffensive-F1        0.8000\n"
        );
    }

    #[test]
    fn test_from_predictions_misaligned() {
        let err = EvaluationTable::from_predictions(&[], vec![Prediction {
            offensive: 1,
            minority_group: Slot::NotApplicable,
            stereotype: Slot::NotApplicable,
        }])
        .unwrap_err();
        assert!(matches!(err, EvalError::Alignment { .. }));
    }

    #[test]
    fn test_non_binary_prediction_rejected() {
        assert!(EvaluationTable::new(vec![row(1, 3, &[], "x")]).is_err());
    }

    #[test]
    fn test_write_jsonl_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_predictions.jsonl");
        sample_table().write_jsonl(&path).unwrap();
        sample_table().write_jsonl(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        let first: EvaluationRow = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first, sample_table().rows()[0]);
    }
}
