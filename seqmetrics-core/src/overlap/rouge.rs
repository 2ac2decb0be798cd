//! ROUGE-N, ROUGE-L and summary-level ROUGE-Lsum.
//!
//! Each example is scored on its own and the corpus score is the mean
//! F-measure across examples, scaled to 0-100.

use std::collections::HashMap;

use tracing::debug;

use crate::config::RougeConfig;
use crate::error::{MetricsError, Result};
use crate::metric::{Metric, Scores, check_aligned, mean, texts};
use crate::text::tokenize::rouge_tokens;
use crate::value::Value;

/// A single ROUGE variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RougeType {
    /// N-gram overlap of the given order.
    N(usize),
    /// Longest common subsequence over the whole text.
    L,
    /// Union LCS over newline-separated sentences.
    LSum,
}

impl RougeType {
    /// Parse a score key such as `rouge2` or `rougeLsum`.
    pub fn parse(key: &str) -> Result<Self> {
        match key {
            "rougeL" => Ok(RougeType::L),
            "rougeLsum" => Ok(RougeType::LSum),
            _ => key
                .strip_prefix("rouge")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .map(RougeType::N)
                .ok_or_else(|| MetricsError::config(format!("unknown rouge type '{key}'"))),
        }
    }
}

/// Precision, recall and F-measure for one example.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

impl RougeScore {
    /// Score for two sides with nothing to compare, e.g. no bigrams in one-word texts.
    fn perfect() -> Self {
        Self {
            precision: 1.0,
            recall: 1.0,
            fmeasure: 1.0,
        }
    }

    fn from_counts(hits: usize, prediction_total: usize, target_total: usize) -> Self {
        let precision = hits as f64 / prediction_total.max(1) as f64;
        let recall = hits as f64 / target_total.max(1) as f64;
        Self {
            precision,
            recall,
            fmeasure: fmeasure(precision, recall),
        }
    }
}

fn fmeasure(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// ROUGE scorer producing one F-measure per configured score key.
#[derive(Debug, Clone)]
pub struct Rouge {
    keys: Vec<(String, RougeType)>,
    split_summaries: bool,
}

impl Default for Rouge {
    fn default() -> Self {
        Self {
            keys: vec![
                ("rouge1".to_string(), RougeType::N(1)),
                ("rouge2".to_string(), RougeType::N(2)),
                ("rougeLsum".to_string(), RougeType::LSum),
            ],
            split_summaries: true,
        }
    }
}

impl Rouge {
    pub fn new(config: RougeConfig) -> Result<Self> {
        let keys = config
            .score_keys
            .iter()
            .map(|k| Ok((k.clone(), RougeType::parse(k)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            keys,
            split_summaries: config.split_summaries,
        })
    }

    /// Score a single target/prediction pair for one variant.
    pub fn score_pair(&self, rouge_type: RougeType, target: &str, prediction: &str) -> RougeScore {
        match rouge_type {
            RougeType::N(n) => {
                score_ngrams(&rouge_tokens(target), &rouge_tokens(prediction), n)
            }
            RougeType::L => score_lcs(&rouge_tokens(target), &rouge_tokens(prediction)),
            RougeType::LSum => {
                let target = self.prepare_summary(target);
                let prediction = self.prepare_summary(prediction);
                score_summary_lcs(&sentences(&target), &sentences(&prediction))
            }
        }
    }

    fn prepare_summary(&self, summary: &str) -> String {
        if self.split_summaries {
            summary.replace(" . ", " .\n")
        } else {
            summary.to_string()
        }
    }
}

impl Metric for Rouge {
    fn compute(&self, targets: &[Value], predictions: &[Value]) -> Result<Scores> {
        check_aligned("rouge", targets, predictions)?;
        let targets = texts("rouge", targets)?;
        let predictions = texts("rouge", predictions)?;

        let mut scores = Scores::new();
        for (key, rouge_type) in &self.keys {
            let fmeasures: Vec<f64> = targets
                .iter()
                .zip(&predictions)
                .map(|(t, p)| self.score_pair(*rouge_type, t, p).fmeasure)
                .collect();
            scores.insert(key.clone(), 100.0 * mean(&fmeasures));
        }
        debug!(examples = targets.len(), ?scores, "Computed ROUGE");
        Ok(scores)
    }
}

/// ROUGE-1, ROUGE-2 and ROUGE-Lsum with the default configuration.
pub fn rouge(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    Rouge::default().compute(targets, predictions)
}

fn sentences(text: &str) -> Vec<Vec<String>> {
    text.split('\n')
        .filter(|s| !s.is_empty())
        .map(rouge_tokens)
        .collect()
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    for window in tokens.windows(n) {
        *counts.entry(window).or_insert(0) += 1;
    }
    counts
}

fn score_ngrams(target: &[String], prediction: &[String], n: usize) -> RougeScore {
    let target_ngrams = ngram_counts(target, n);
    let prediction_ngrams = ngram_counts(prediction, n);
    if target_ngrams.is_empty() && prediction_ngrams.is_empty() {
        return RougeScore::perfect();
    }
    let hits: usize = target_ngrams
        .iter()
        .map(|(ngram, count)| (*count).min(prediction_ngrams.get(ngram).copied().unwrap_or(0)))
        .sum();
    RougeScore::from_counts(
        hits,
        prediction_ngrams.values().sum(),
        target_ngrams.values().sum(),
    )
}

fn lcs_table(reference: &[String], candidate: &[String]) -> Vec<Vec<usize>> {
    let mut table = vec![vec![0; candidate.len() + 1]; reference.len() + 1];
    for i in 1..=reference.len() {
        for j in 1..=candidate.len() {
            table[i][j] = if reference[i - 1] == candidate[j - 1] {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }
    table
}

/// Indices into `reference` of one longest common subsequence with `candidate`.
fn lcs_indices(reference: &[String], candidate: &[String]) -> Vec<usize> {
    let table = lcs_table(reference, candidate);
    let (mut i, mut j) = (reference.len(), candidate.len());
    let mut indices = Vec::new();
    while i > 0 && j > 0 {
        if reference[i - 1] == candidate[j - 1] {
            indices.push(i - 1);
            i -= 1;
            j -= 1;
        } else if table[i][j - 1] > table[i - 1][j] {
            j -= 1;
        } else {
            i -= 1;
        }
    }
    indices.reverse();
    indices
}

fn score_lcs(target: &[String], prediction: &[String]) -> RougeScore {
    if target.is_empty() && prediction.is_empty() {
        return RougeScore::perfect();
    }
    if target.is_empty() || prediction.is_empty() {
        return RougeScore::default();
    }
    let lcs = lcs_table(target, prediction)[target.len()][prediction.len()];
    RougeScore::from_counts(lcs, prediction.len(), target.len())
}

fn score_summary_lcs(target: &[Vec<String>], prediction: &[Vec<String>]) -> RougeScore {
    let target_len: usize = target.iter().map(Vec::len).sum();
    let prediction_len: usize = prediction.iter().map(Vec::len).sum();
    if target_len == 0 && prediction_len == 0 {
        return RougeScore::perfect();
    }
    if target_len == 0 || prediction_len == 0 {
        return RougeScore::default();
    }

    let mut target_counts: HashMap<&str, usize> = HashMap::new();
    let mut prediction_counts: HashMap<&str, usize> = HashMap::new();
    for token in target.iter().flatten() {
        *target_counts.entry(token.as_str()).or_insert(0) += 1;
    }
    for token in prediction.iter().flatten() {
        *prediction_counts.entry(token.as_str()).or_insert(0) += 1;
    }

    let mut hits = 0;
    for sentence in target {
        let mut union: Vec<usize> = prediction
            .iter()
            .flat_map(|candidate| lcs_indices(sentence, candidate))
            .collect();
        union.sort_unstable();
        union.dedup();

        for index in union {
            let token = sentence[index].as_str();
            let (Some(t), Some(p)) = (target_counts.get_mut(token), prediction_counts.get_mut(token))
            else {
                continue;
            };
            if *t > 0 && *p > 0 {
                hits += 1;
                *t -= 1;
                *p -= 1;
            }
        }
    }
    RougeScore::from_counts(hits, prediction_len, target_len)
}
