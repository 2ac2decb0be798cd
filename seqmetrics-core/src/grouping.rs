//! Per-group metric averaging.
//!
//! Examples are bucketed by the group key on their target record, the wrapped
//! metric runs on each bucket, and every score name is averaged across groups
//! with equal weight regardless of group size.

use std::collections::HashMap;

use tracing::debug;

use crate::config::GroupingConfig;
use crate::error::{MetricsError, Result};
use crate::metric::{Metric, Scores, check_aligned, mean};
use crate::value::{Label, Value};

/// Targets and predictions belonging to one group, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub key: Option<Label>,
    pub targets: Vec<Value>,
    pub predictions: Vec<Value>,
}

/// Wraps a metric so it is computed per group and averaged unweighted.
#[derive(Debug, Clone)]
pub struct MeanGroupMetric<M> {
    metric: M,
    config: GroupingConfig,
}

impl<M: Metric> MeanGroupMetric<M> {
    pub fn new(metric: M) -> Self {
        Self::with_config(metric, GroupingConfig::default())
    }

    pub fn with_config(metric: M, config: GroupingConfig) -> Self {
        Self { metric, config }
    }

    pub fn inner(&self) -> &M {
        &self.metric
    }

    /// Partition positions by group key, in order of first appearance.
    pub fn partition(&self, targets: &[Value], predictions: &[Value]) -> Result<Vec<Group>> {
        let group_key = self.config.group_key.as_str();
        let value_key = self.config.value_key.as_str();
        let mut index: HashMap<Label, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();

        for (i, (target, prediction)) in targets.iter().zip(predictions).enumerate() {
            let key = target
                .get(group_key)
                .ok_or_else(|| MetricsError::missing_key(group_key, i))?
                .to_label()
                .map_err(|_| {
                    MetricsError::invalid_input(format!(
                        "group key at position {i} must be text, bytes, an integer or a bool"
                    ))
                })?;
            let target_value = target
                .get(value_key)
                .ok_or_else(|| MetricsError::missing_key(value_key, i))?;
            let prediction_value = prediction
                .get(value_key)
                .ok_or_else(|| MetricsError::missing_key(value_key, i))?;

            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push(Group {
                    key: Some(key),
                    ..Group::default()
                });
                groups.len() - 1
            });
            groups[slot].targets.push(target_value.clone());
            groups[slot].predictions.push(prediction_value.clone());
        }
        Ok(groups)
    }
}

impl<M: Metric> Metric for MeanGroupMetric<M> {
    fn compute(&self, targets: &[Value], predictions: &[Value]) -> Result<Scores> {
        check_aligned("mean_group_metric", targets, predictions)?;
        let groups = self.partition(targets, predictions)?;

        let mut per_name: Vec<(String, Vec<f64>)> = Vec::new();
        for group in &groups {
            for (name, score) in self.metric.compute(&group.targets, &group.predictions)? {
                match per_name.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, scores)) => scores.push(score),
                    None => per_name.push((name, vec![score])),
                }
            }
        }

        let scores: Scores = per_name
            .into_iter()
            .map(|(name, scores)| (name, mean(&scores)))
            .collect();
        debug!(groups = groups.len(), ?scores, "Computed grouped metric");
        Ok(scores)
    }
}

/// Wrap `metric` so that it is averaged across `group` buckets.
pub fn mean_group_metric<M: Metric>(metric: M) -> MeanGroupMetric<M> {
    MeanGroupMetric::new(metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::accuracy;

    fn target(group: &str, value: i64) -> Value {
        Value::record([("group", Value::text(group)), ("value", Value::Int(value))])
    }

    fn prediction(value: i64) -> Value {
        Value::record([("value", Value::Int(value))])
    }

    #[test]
    fn test_mean_group_accuracy() {
        let metric = mean_group_metric(accuracy);
        let scores = metric
            .compute(
                &[target("a", 0), target("a", 1), target("b", 0)],
                &[prediction(0), prediction(0), prediction(1)],
            )
            .unwrap();
        assert!((scores["accuracy"] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_partition_keeps_first_appearance_order() {
        let metric = mean_group_metric(accuracy);
        let groups = metric
            .partition(
                &[target("b", 0), target("a", 1), target("b", 2)],
                &[prediction(0), prediction(1), prediction(2)],
            )
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, Some(Label::Text("b".into())));
        assert_eq!(groups[0].targets, vec![Value::Int(0), Value::Int(2)]);
        assert_eq!(groups[1].predictions, vec![Value::Int(1)]);
    }

    #[test]
    fn test_missing_group_key_is_an_error() {
        let metric = mean_group_metric(accuracy);
        let err = metric
            .compute(&[Value::record([("value", 0)])], &[prediction(0)])
            .unwrap_err();
        assert!(matches!(err, MetricsError::MissingKey { ref key, position: 0 } if key == "group"));
    }

    #[test]
    fn test_non_scalar_group_key_is_an_error() {
        let metric = mean_group_metric(accuracy);
        let bad = Value::record([("group", Value::list([1, 2])), ("value", Value::Int(0))]);
        assert!(matches!(
            metric.compute(&[bad], &[prediction(0)]),
            Err(MetricsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_custom_keys() {
        let metric = MeanGroupMetric::with_config(
            accuracy,
            GroupingConfig {
                group_key: "task".into(),
                value_key: "label".into(),
            },
        );
        let targets = vec![Value::record([("task", Value::text("x")), ("label", Value::Int(1))])];
        let predictions = vec![Value::record([("label", Value::Int(1))])];
        assert_eq!(metric.compute(&targets, &predictions).unwrap()["accuracy"], 100.0);
    }
}
