//! The metric-function contract shared by every scorer in the crate.

use std::collections::BTreeMap;

use crate::error::{MetricsError, Result};
use crate::value::Value;

/// Metric name to score. Scores are percentages unless documented otherwise.
pub type Scores = BTreeMap<String, f64>;

/// A scoring function over aligned targets and predictions.
///
/// Implementations must be pure: the same inputs always produce the same
/// scores. Closures with the matching signature implement the trait, so a
/// plain `fn` can be wrapped by [`crate::grouping::MeanGroupMetric`].
pub trait Metric {
    /// Score `predictions` against `targets`, position by position.
    fn compute(&self, targets: &[Value], predictions: &[Value]) -> Result<Scores>;
}

impl<F> Metric for F
where
    F: Fn(&[Value], &[Value]) -> Result<Scores>,
{
    fn compute(&self, targets: &[Value], predictions: &[Value]) -> Result<Scores> {
        self(targets, predictions)
    }
}

/// Fail fast unless both sequences are non-empty and of equal length.
pub(crate) fn check_aligned(metric: &str, targets: &[Value], predictions: &[Value]) -> Result<()> {
    if targets.len() != predictions.len() {
        return Err(MetricsError::length_mismatch(
            metric,
            targets.len(),
            predictions.len(),
        ));
    }
    if targets.is_empty() {
        return Err(MetricsError::empty_input(metric));
    }
    Ok(())
}

/// Build a single-entry score mapping.
pub(crate) fn single(name: impl Into<String>, score: f64) -> Scores {
    let mut scores = Scores::new();
    scores.insert(name.into(), score);
    scores
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Decode every element of a sequence as text, naming the offending position on error.
pub(crate) fn texts(metric: &str, values: &[Value]) -> Result<Vec<String>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_text().map(|s| s.into_owned()).map_err(|e| match e {
                MetricsError::InvalidInput(msg) => {
                    MetricsError::invalid_input(format!("{metric}: position {i}: {msg}"))
                }
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_aligned() {
        let one = [Value::Int(1)];
        let two = [Value::Int(1), Value::Int(2)];
        assert!(check_aligned("m", &one, &one).is_ok());
        assert!(matches!(
            check_aligned("m", &one, &two),
            Err(MetricsError::LengthMismatch {
                targets: 1,
                predictions: 2,
                ..
            })
        ));
        assert!(matches!(
            check_aligned("m", &[], &[]),
            Err(MetricsError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_closure_is_a_metric() {
        let count = |t: &[Value], _p: &[Value]| -> Result<Scores> { Ok(single("n", t.len() as f64)) };
        let scores = count.compute(&[Value::Null, Value::Null], &[]).unwrap();
        assert_eq!(scores["n"], 2.0);
    }

    #[test]
    fn test_texts_reports_position() {
        let err = texts("bleu", &[Value::text("ok"), Value::Int(3)]).unwrap_err();
        assert!(err.to_string().contains("position 1"));
    }
}
