//! Correlation coefficients, reported ×100.
//!
//! Degenerate inputs (zero variance) score 0 rather than failing.

use std::collections::HashMap;

use tracing::debug;

use crate::classification::labels;
use crate::error::{MetricsError, Result};
use crate::metric::{Scores, check_aligned, single};
use crate::value::{Label, Value};

/// Pearson product-moment correlation.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// 1-based ranks; tied values share the mean of the ranks they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        // Positions start..=end share ranks start+1..=end+1.
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = rank;
        }
        start = end + 1;
    }
    ranks
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Matthews correlation for any number of classes.
pub fn matthews(targets: &[Label], predictions: &[Label]) -> f64 {
    let n = targets.len() as f64;
    let mut true_counts: HashMap<&Label, f64> = HashMap::new();
    let mut pred_counts: HashMap<&Label, f64> = HashMap::new();
    let mut correct = 0.0;
    for (t, p) in targets.iter().zip(predictions) {
        *true_counts.entry(t).or_insert(0.0) += 1.0;
        *pred_counts.entry(p).or_insert(0.0) += 1.0;
        if t == p {
            correct += 1.0;
        }
    }

    let cross: f64 = pred_counts
        .iter()
        .map(|(label, p)| p * true_counts.get(label).copied().unwrap_or(0.0))
        .sum();
    let pred_sq: f64 = pred_counts.values().map(|p| p * p).sum();
    let true_sq: f64 = true_counts.values().map(|t| t * t).sum();

    let numerator = correct * n - cross;
    let denominator = ((n * n - pred_sq) * (n * n - true_sq)).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

fn numbers(metric: &str, values: &[Value]) -> Result<Vec<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64().ok_or_else(|| {
                MetricsError::invalid_input(format!(
                    "{metric}: position {i}: expected a number, got {}",
                    v.kind()
                ))
            })
        })
        .collect()
}

/// Pearson correlation ×100.
pub fn pearson_corrcoef(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    check_aligned("pearson_corrcoef", targets, predictions)?;
    let x = numbers("pearson_corrcoef", targets)?;
    let y = numbers("pearson_corrcoef", predictions)?;
    let r = pearson(&x, &y);
    debug!(examples = x.len(), r, "Computed Pearson correlation");
    Ok(single("pearson_corrcoef", 100.0 * r))
}

/// Spearman rank correlation ×100.
pub fn spearman_corrcoef(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    check_aligned("spearman_corrcoef", targets, predictions)?;
    let x = numbers("spearman_corrcoef", targets)?;
    let y = numbers("spearman_corrcoef", predictions)?;
    let rho = spearman(&x, &y);
    debug!(examples = x.len(), rho, "Computed Spearman correlation");
    Ok(single("spearman_corrcoef", 100.0 * rho))
}

/// Matthews correlation ×100.
pub fn matthews_corrcoef(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    check_aligned("matthews_corrcoef", targets, predictions)?;
    let t = labels("matthews_corrcoef", targets)?;
    let p = labels("matthews_corrcoef", predictions)?;
    let mcc = matthews(&t, &p);
    debug!(examples = t.len(), mcc, "Computed Matthews correlation");
    Ok(single("matthews_corrcoef", 100.0 * mcc))
}
