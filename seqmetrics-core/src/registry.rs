//! Name-based lookup of the built-in metrics.
//!
//! A harness that picks metrics from a task definition refers to them by
//! name. Besides the fixed names, two families are resolved on demand:
//! `mean_<N>class_f1` builds a macro-F1 over `N` classes, and
//! `mean_group:<name>` wraps any resolvable metric in the grouping wrapper.

use std::collections::BTreeMap;

use tracing::debug;

use crate::classification::{F1WithInvalid, MeanMulticlassF1, accuracy, exact_match, sequence_accuracy};
use crate::config::MetricsConfig;
use crate::correlation::{matthews_corrcoef, pearson_corrcoef, spearman_corrcoef};
use crate::error::{MetricsError, Result};
use crate::grouping::MeanGroupMetric;
use crate::metric::{Metric, Scores};
use crate::overlap::{Bleu, Rouge};
use crate::qa::{Qa, SpanQa};
use crate::value::Value;

/// A metric stored behind a trait object.
pub type BoxedMetric = Box<dyn Metric + Send + Sync>;

const GROUP_PREFIX: &str = "mean_group:";

/// Registry of named metrics built from one configuration.
pub struct MetricRegistry {
    config: MetricsConfig,
    metrics: BTreeMap<String, BoxedMetric>,
}

impl MetricRegistry {
    /// Register every built-in metric, configured from `config`.
    pub fn new(config: MetricsConfig) -> Result<Self> {
        config.validate()?;
        let mut registry = Self {
            config: config.clone(),
            metrics: BTreeMap::new(),
        };
        registry.register("bleu", Bleu::new(config.bleu.clone()));
        registry.register("rouge", Rouge::new(config.rouge.clone())?);
        registry.register("qa", Qa::new(config.qa.clone()));
        registry.register("span_qa", SpanQa::new(config.qa.clone()));
        registry.register("exact_match", exact_match);
        registry.register("accuracy", accuracy);
        registry.register("sequence_accuracy", sequence_accuracy);
        registry.register(
            "f1_score_with_invalid",
            F1WithInvalid::new(config.classification.clone()),
        );
        registry.register("pearson_corrcoef", pearson_corrcoef);
        registry.register("spearman_corrcoef", spearman_corrcoef);
        registry.register("matthews_corrcoef", matthews_corrcoef);
        debug!(count = registry.metrics.len(), "Registered built-in metrics");
        Ok(registry)
    }

    /// Add or replace a named metric.
    pub fn register(&mut self, name: impl Into<String>, metric: impl Metric + Send + Sync + 'static) {
        self.metrics.insert(name.into(), Box::new(metric));
    }

    /// Names of the registered metrics, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.metrics.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
            || parse_multiclass(name).is_some()
            || name
                .strip_prefix(GROUP_PREFIX)
                .is_some_and(|inner| self.contains(inner))
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Run the metric called `name`.
    pub fn compute(&self, name: &str, targets: &[Value], predictions: &[Value]) -> Result<Scores> {
        if let Some(metric) = self.metrics.get(name) {
            return metric.compute(targets, predictions);
        }
        if let Some(num_classes) = parse_multiclass(name) {
            return MeanMulticlassF1::new(num_classes).compute(targets, predictions);
        }
        if let Some(inner) = name.strip_prefix(GROUP_PREFIX) {
            if !self.contains(inner) {
                return Err(MetricsError::UnknownMetric(inner.to_string()));
            }
            let wrapped = |t: &[Value], p: &[Value]| self.compute(inner, t, p);
            return MeanGroupMetric::with_config(wrapped, self.config.grouping.clone())
                .compute(targets, predictions);
        }
        Err(MetricsError::UnknownMetric(name.to_string()))
    }
}

/// `mean_3class_f1` -> `Some(3)`.
fn parse_multiclass(name: &str) -> Option<usize> {
    name.strip_prefix("mean_")?
        .strip_suffix("class_f1")?
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MetricRegistry {
        MetricRegistry::new(MetricsConfig::default()).unwrap()
    }

    #[test]
    fn test_builtin_names() {
        let registry = registry();
        let names = registry.names();
        for name in ["bleu", "rouge", "qa", "span_qa", "accuracy", "matthews_corrcoef"] {
            assert!(names.contains(&name), "missing {name}");
        }
    }

    #[test]
    fn test_compute_by_name() {
        let registry = registry();
        let targets = vec![Value::Int(1), Value::Int(0)];
        let scores = registry.compute("accuracy", &targets, &targets).unwrap();
        assert_eq!(scores["accuracy"], 100.0);
    }

    #[test]
    fn test_multiclass_family() {
        let registry = registry();
        assert!(registry.contains("mean_3class_f1"));
        assert!(!registry.contains("mean_0class_f1"));
        let t = vec![Value::Int(0), Value::Int(1), Value::Int(1), Value::Int(2)];
        let p = vec![Value::Int(0), Value::Int(0), Value::Int(2), Value::Int(2)];
        let scores = registry.compute("mean_3class_f1", &t, &p).unwrap();
        assert!((scores["mean_3class_f1"] - 44.44444444444444).abs() < 1e-9);
    }

    #[test]
    fn test_group_family() {
        let registry = registry();
        let t = vec![
            Value::record([("group", Value::text("a")), ("value", Value::Int(0))]),
            Value::record([("group", Value::text("a")), ("value", Value::Int(1))]),
            Value::record([("group", Value::text("b")), ("value", Value::Int(0))]),
        ];
        let p = vec![
            Value::record([("value", Value::Int(0))]),
            Value::record([("value", Value::Int(0))]),
            Value::record([("value", Value::Int(1))]),
        ];
        let scores = registry.compute("mean_group:accuracy", &t, &p).unwrap();
        assert!((scores["accuracy"] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_metric() {
        let registry = registry();
        assert!(matches!(
            registry.compute("nope", &[Value::Null], &[Value::Null]),
            Err(MetricsError::UnknownMetric(_))
        ));
        assert!(matches!(
            registry.compute("mean_group:nope", &[Value::Null], &[Value::Null]),
            Err(MetricsError::UnknownMetric(_))
        ));
    }

    #[test]
    fn test_register_custom_metric() {
        let mut registry = registry();
        registry.register("count", |t: &[Value], _p: &[Value]| -> Result<Scores> {
            Ok(Scores::from([("count".to_string(), t.len() as f64)]))
        });
        let scores = registry.compute("count", &[Value::Null], &[Value::Null]).unwrap();
        assert_eq!(scores["count"], 1.0);
    }
}
