//! Label-comparison metrics: accuracy variants and F1 scores.

use std::collections::HashSet;

use tracing::debug;

use crate::config::ClassificationConfig;
use crate::error::{MetricsError, Result};
use crate::metric::{Metric, Scores, check_aligned, single};
use crate::value::{Label, Value};

/// Confusion counts for a single class treated as positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ClassCounts {
    /// F1 in [0, 1]; 0 when the class is neither present nor predicted.
    pub fn f1(&self) -> f64 {
        let denom = 2 * self.true_positives + self.false_positives + self.false_negatives;
        if denom == 0 {
            0.0
        } else {
            2.0 * self.true_positives as f64 / denom as f64
        }
    }
}

/// Percentage of positions whose prediction equals the target exactly.
fn match_rate(metric: &str, targets: &[Value], predictions: &[Value]) -> Result<f64> {
    check_aligned(metric, targets, predictions)?;
    let mut matches = 0usize;
    for (target, prediction) in targets.iter().zip(predictions) {
        if target.matches(prediction)? {
            matches += 1;
        }
    }
    let rate = 100.0 * matches as f64 / targets.len() as f64;
    debug!(metric, examples = targets.len(), matches, rate, "Computed match rate");
    Ok(rate)
}

/// Fraction of exactly equal positions, without normalization.
pub fn exact_match(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    Ok(single("exact_match", match_rate("exact_match", targets, predictions)?))
}

/// Classification accuracy.
pub fn accuracy(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    Ok(single("accuracy", match_rate("accuracy", targets, predictions)?))
}

/// Whole-sequence accuracy: a prediction counts only if the entire string matches.
pub fn sequence_accuracy(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    Ok(single(
        "sequence_accuracy",
        match_rate("sequence_accuracy", targets, predictions)?,
    ))
}

/// Binary F1 that tolerates predictions outside the target label set.
///
/// An invalid prediction is always wrong: a false negative when the target is
/// the positive label, otherwise a false positive.
#[derive(Debug, Clone, Default)]
pub struct F1WithInvalid {
    config: ClassificationConfig,
}

impl F1WithInvalid {
    pub fn new(config: ClassificationConfig) -> Self {
        Self { config }
    }

    pub fn counts(&self, targets: &[Label], predictions: &[Option<Label>]) -> ClassCounts {
        let positive = &self.config.positive_label;
        let valid: HashSet<&Label> = targets.iter().collect();
        let mut counts = ClassCounts::default();

        for (target, prediction) in targets.iter().zip(predictions) {
            let is_positive = target == positive;
            match prediction.as_ref().filter(|p| valid.contains(p)) {
                Some(p) if p == positive => {
                    if is_positive {
                        counts.true_positives += 1;
                    } else {
                        counts.false_positives += 1;
                    }
                }
                Some(_) => {
                    if is_positive {
                        counts.false_negatives += 1;
                    }
                }
                None => {
                    if is_positive {
                        counts.false_negatives += 1;
                    } else {
                        counts.false_positives += 1;
                    }
                }
            }
        }
        counts
    }
}

impl Metric for F1WithInvalid {
    fn compute(&self, targets: &[Value], predictions: &[Value]) -> Result<Scores> {
        check_aligned("f1_score_with_invalid", targets, predictions)?;
        let targets = labels("f1_score_with_invalid", targets)?;
        let predictions = prediction_labels(predictions)?;

        let counts = self.counts(&targets, &predictions);
        debug!(?counts, "Computed F1 with invalid predictions");
        Ok(single("f1", 100.0 * counts.f1()))
    }
}

/// Binary F1 with the positive label `1`, counting invalid predictions as wrong.
pub fn f1_score_with_invalid(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    F1WithInvalid::default().compute(targets, predictions)
}

/// Macro-averaged F1 over the labels `0..num_classes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeanMulticlassF1 {
    num_classes: usize,
}

impl MeanMulticlassF1 {
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Score key, e.g. `mean_3class_f1`.
    pub fn key(&self) -> String {
        format!("mean_{}class_f1", self.num_classes)
    }

    pub fn per_class_counts(&self, targets: &[Label], predictions: &[Option<Label>]) -> Vec<ClassCounts> {
        (0..self.num_classes)
            .map(|class| {
                let class = Label::Int(class as i64);
                let mut counts = ClassCounts::default();
                for (target, prediction) in targets.iter().zip(predictions) {
                    let predicted = prediction.as_ref() == Some(&class);
                    match (*target == class, predicted) {
                        (true, true) => counts.true_positives += 1,
                        (false, true) => counts.false_positives += 1,
                        (true, false) => counts.false_negatives += 1,
                        (false, false) => {}
                    }
                }
                counts
            })
            .collect()
    }
}

impl Metric for MeanMulticlassF1 {
    fn compute(&self, targets: &[Value], predictions: &[Value]) -> Result<Scores> {
        if self.num_classes == 0 {
            return Err(MetricsError::invalid_input(
                "mean_multiclass_f1 needs at least one class",
            ));
        }
        check_aligned(&self.key(), targets, predictions)?;
        let targets = labels(&self.key(), targets)?;
        let predictions = prediction_labels(predictions)?;

        let per_class = self.per_class_counts(&targets, &predictions);
        let macro_f1 = per_class.iter().map(ClassCounts::f1).sum::<f64>() / self.num_classes as f64;
        debug!(num_classes = self.num_classes, macro_f1, "Computed macro F1");
        Ok(single(self.key(), 100.0 * macro_f1))
    }
}

/// Build a macro-F1 metric over `num_classes` integer labels.
pub fn mean_multiclass_f1(num_classes: usize) -> MeanMulticlassF1 {
    MeanMulticlassF1::new(num_classes)
}

/// Labels for predictions that may fall outside the label space.
///
/// Non-scalar predictions become `None`; undecodable bytes are still an error.
fn prediction_labels(values: &[Value]) -> Result<Vec<Option<Label>>> {
    values
        .iter()
        .map(|v| match v.to_label() {
            Ok(label) => Ok(Some(label)),
            Err(MetricsError::Encoding(e)) => Err(MetricsError::Encoding(e)),
            Err(_) => Ok(None),
        })
        .collect()
}

pub(crate) fn labels(metric: &str, values: &[Value]) -> Result<Vec<Label>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.to_label().map_err(|e| match e {
                MetricsError::InvalidInput(msg) => {
                    MetricsError::invalid_input(format!("{metric}: position {i}: {msg}"))
                }
                other => other,
            })
        })
        .collect()
}
