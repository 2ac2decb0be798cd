//! Question-answering metrics: normalized exact match and token F1.
//!
//! Every target position holds a set of acceptable answers; a prediction is
//! credited with its best exact match and its best F1 across that set.
//! `span_qa` first turns a predicted `"start:<i> end:<j>"` span into the
//! context words it points at, then scores it the same way.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::QaConfig;
use crate::error::{MetricsError, Result};
use crate::metric::{Metric, Scores, check_aligned, mean};
use crate::text::{normalize_answer, word_tokens};
use crate::value::Value;

/// Exact-match and F1 scorer over reference-answer sets.
#[derive(Debug, Clone, Default)]
pub struct Qa {
    config: QaConfig,
}

impl Qa {
    pub fn new(config: QaConfig) -> Self {
        Self { config }
    }

    /// Best (exact match, F1) of `prediction` over `answers`, each in [0, 1].
    pub fn score_example(&self, answers: &[String], prediction: &str) -> (f64, f64) {
        let prediction = normalize_answer(prediction, self.config.strip_articles);
        answers
            .iter()
            .map(|answer| normalize_answer(answer, self.config.strip_articles))
            .map(|answer| (exact_match_score(&answer, &prediction), f1_score(&answer, &prediction)))
            .fold((0.0_f64, 0.0_f64), |(em, f1), (e, f)| (em.max(e), f1.max(f)))
    }

    fn score_all(&self, answers: &[Vec<String>], predictions: &[String]) -> Scores {
        let (ems, f1s): (Vec<f64>, Vec<f64>) = answers
            .iter()
            .zip(predictions)
            .map(|(a, p)| self.score_example(a, p))
            .unzip();
        let mut scores = Scores::new();
        scores.insert("em".to_string(), 100.0 * mean(&ems));
        scores.insert("f1".to_string(), 100.0 * mean(&f1s));
        scores
    }
}

impl Metric for Qa {
    fn compute(&self, targets: &[Value], predictions: &[Value]) -> Result<Scores> {
        check_aligned("qa", targets, predictions)?;
        let answers = targets
            .iter()
            .enumerate()
            .map(|(i, t)| answer_set("qa", i, t))
            .collect::<Result<Vec<_>>>()?;
        let predictions = predictions
            .iter()
            .map(|p| p.as_text().map(|s| s.into_owned()))
            .collect::<Result<Vec<_>>>()?;

        let scores = self.score_all(&answers, &predictions);
        debug!(examples = predictions.len(), ?scores, "Computed QA scores");
        Ok(scores)
    }
}

/// Span-prediction QA: decode spans against their contexts, then score as [`Qa`].
#[derive(Debug, Clone, Default)]
pub struct SpanQa {
    qa: Qa,
}

impl SpanQa {
    pub fn new(config: QaConfig) -> Self {
        Self { qa: Qa::new(config) }
    }
}

impl Metric for SpanQa {
    fn compute(&self, targets: &[Value], predictions: &[Value]) -> Result<Scores> {
        check_aligned("span_qa", targets, predictions)?;
        let mut answers = Vec::with_capacity(targets.len());
        let mut decoded = Vec::with_capacity(targets.len());

        for (i, (target, prediction)) in targets.iter().zip(predictions).enumerate() {
            let answer_value = target
                .get("answers")
                .ok_or_else(|| MetricsError::missing_key("answers", i))?;
            let context = target
                .get("context")
                .ok_or_else(|| MetricsError::missing_key("context", i))?
                .as_text()?;
            answers.push(answer_set("span_qa", i, answer_value)?);
            decoded.push(decode_span(&context, &prediction.as_text()?));
        }

        let scores = self.qa.score_all(&answers, &decoded);
        debug!(examples = decoded.len(), ?scores, "Computed span QA scores");
        Ok(scores)
    }
}

/// QA exact match and F1 with the default normalization.
pub fn qa(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    Qa::default().compute(targets, predictions)
}

/// Span QA with the default normalization.
pub fn span_qa(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    SpanQa::default().compute(targets, predictions)
}

/// Resolve a `"start:<i> end:<j>"` span into the context words `i..=j`.
///
/// Both strings are split on non-word characters. Anything that does not
/// parse as a span, or falls outside the context, yields an empty answer.
pub fn decode_span(context: &str, span: &str) -> String {
    let span_tokens = word_split(span);
    if span_tokens.len() < 4 {
        debug!(span, "Span has too few tokens, decoding as empty");
        return String::new();
    }
    let (Ok(start), Ok(end)) = (span_tokens[1].parse::<usize>(), span_tokens[3].parse::<usize>())
    else {
        debug!(span, "Span offsets are not integers, decoding as empty");
        return String::new();
    };

    let context_tokens = word_split(context);
    let stop = end.saturating_add(1).min(context_tokens.len());
    let answer = if start < stop {
        context_tokens[start..stop].join(" ")
    } else {
        String::new()
    };
    trace!(span, start, end, answer = %answer, "Decoded span");
    answer
}

fn word_split(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect()
}

/// A target's acceptable answers. A bare string counts as a single answer.
fn answer_set(metric: &str, position: usize, target: &Value) -> Result<Vec<String>> {
    match target {
        Value::List(items) => items
            .iter()
            .map(|item| item.as_text().map(|s| s.into_owned()))
            .collect(),
        Value::Text(_) | Value::Bytes(_) => Ok(vec![target.as_text()?.into_owned()]),
        other => Err(MetricsError::invalid_input(format!(
            "{metric}: position {position}: expected a list of answers, got {}",
            other.kind()
        ))),
    }
}

fn exact_match_score(target: &str, prediction: &str) -> f64 {
    if target == prediction { 1.0 } else { 0.0 }
}

/// Token-overlap F1 between two normalized answers.
fn f1_score(target: &str, prediction: &str) -> f64 {
    let target_tokens = word_tokens(target);
    let prediction_tokens = word_tokens(prediction);
    if target_tokens.is_empty() || prediction_tokens.is_empty() {
        return exact_match_score(target, prediction);
    }

    let mut target_counts: HashMap<&str, usize> = HashMap::new();
    for token in &target_tokens {
        *target_counts.entry(*token).or_insert(0) += 1;
    }
    let mut common = 0;
    for token in &prediction_tokens {
        if let Some(count) = target_counts.get_mut(token) {
            if *count > 0 {
                *count -= 1;
                common += 1;
            }
        }
    }
    if common == 0 {
        return 0.0;
    }
    let precision = common as f64 / prediction_tokens.len() as f64;
    let recall = common as f64 / target_tokens.len() as f64;
    2.0 * precision * recall / (precision + recall)
}
