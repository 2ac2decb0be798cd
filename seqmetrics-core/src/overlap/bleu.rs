//! Corpus-level BLEU.
//!
//! Statistics are accumulated over the whole corpus before the score is taken:
//! clipped n-gram matches and candidate n-gram totals per order, the summed
//! hypothesis length and the summed closest reference length. The score is the
//! geometric mean of the (optionally smoothed) precisions times the brevity
//! penalty, reported on a 0-100 scale.

use std::collections::HashMap;

use tracing::debug;

use crate::config::{BleuConfig, SmoothMethod};
use crate::error::Result;
use crate::metric::{Metric, Scores, check_aligned, single, texts};
use crate::text::tokenize::bleu_tokens;
use crate::value::Value;

/// Sufficient statistics for corpus BLEU.
#[derive(Debug, Clone, PartialEq)]
pub struct BleuStats {
    pub correct: Vec<f64>,
    pub total: Vec<f64>,
    /// N-grams per order in the longest reference of each example.
    pub ref_total: Vec<f64>,
    pub sys_len: usize,
    pub ref_len: usize,
}

impl BleuStats {
    fn new(order: usize) -> Self {
        Self {
            correct: vec![0.0; order],
            total: vec![0.0; order],
            ref_total: vec![0.0; order],
            sys_len: 0,
            ref_len: 0,
        }
    }
}

/// Corpus BLEU scorer.
#[derive(Debug, Clone, Default)]
pub struct Bleu {
    config: BleuConfig,
}

impl Bleu {
    pub fn new(config: BleuConfig) -> Self {
        Self { config }
    }

    /// Accumulate corpus statistics. Each hypothesis may have several references.
    pub fn corpus_stats(&self, hypotheses: &[String], references: &[Vec<String>]) -> BleuStats {
        let order = self.config.max_ngram_order;
        let mut stats = BleuStats::new(order);

        for (hyp, refs) in hypotheses.iter().zip(references) {
            let hyp_tokens = self.tokenize(hyp);
            let ref_tokens: Vec<Vec<String>> = refs.iter().map(|r| self.tokenize(r)).collect();

            stats.sys_len += hyp_tokens.len();
            stats.ref_len += closest_ref_len(hyp_tokens.len(), &ref_tokens);
            let longest_ref = ref_tokens.iter().map(Vec::len).max().unwrap_or(0);
            for (n, ref_total) in stats.ref_total.iter_mut().enumerate() {
                *ref_total += longest_ref.saturating_sub(n) as f64;
            }

            let hyp_ngrams = count_ngrams(&hyp_tokens, order);
            let mut max_ref_ngrams: HashMap<&[String], usize> = HashMap::new();
            for tokens in &ref_tokens {
                for (ngram, count) in count_ngrams(tokens, order) {
                    let entry = max_ref_ngrams.entry(ngram).or_insert(0);
                    *entry = (*entry).max(count);
                }
            }

            for (ngram, count) in &hyp_ngrams {
                let n = ngram.len() - 1;
                stats.total[n] += *count as f64;
                if let Some(ref_count) = max_ref_ngrams.get(ngram) {
                    stats.correct[n] += (*count).min(*ref_count) as f64;
                }
            }
        }
        stats
    }

    /// Turn corpus statistics into a 0-100 score.
    pub fn score_from_stats(&self, stats: &BleuStats) -> f64 {
        let order = self.config.max_ngram_order;
        let mut correct = stats.correct.clone();
        let mut total = stats.total.clone();
        let mut precisions = vec![0.0_f64; order];
        let mut smooth_mteval = 1.0_f64;

        for n in 0..order {
            // An order too long for every sentence on both sides cannot disagree.
            if stats.total[n] == 0.0 && stats.ref_total[n] == 0.0 {
                precisions[n] = 100.0;
                continue;
            }
            if self.config.smooth_method == SmoothMethod::AddK && n > 0 {
                correct[n] += self.config.smooth_value;
                total[n] += self.config.smooth_value;
            }
            if total[n] == 0.0 {
                break;
            }
            precisions[n] = if correct[n] == 0.0 {
                match self.config.smooth_method {
                    SmoothMethod::Exp => {
                        smooth_mteval *= 2.0;
                        100.0 / (smooth_mteval * total[n])
                    }
                    SmoothMethod::Floor => 100.0 * self.config.smooth_value / total[n],
                    SmoothMethod::None | SmoothMethod::AddK => 0.0,
                }
            } else {
                100.0 * correct[n] / total[n]
            };
        }

        let brevity_penalty = if stats.sys_len == 0 {
            0.0
        } else if stats.sys_len < stats.ref_len {
            (1.0 - stats.ref_len as f64 / stats.sys_len as f64).exp()
        } else {
            1.0
        };

        if brevity_penalty == 0.0 || precisions.iter().any(|p| *p <= 0.0) {
            return 0.0;
        }
        let log_mean = precisions.iter().map(|p| p.ln()).sum::<f64>() / order as f64;
        brevity_penalty * log_mean.exp()
    }

    fn tokenize(&self, line: &str) -> Vec<String> {
        bleu_tokens(line, self.config.tokenize, self.config.lowercase)
    }
}

impl Metric for Bleu {
    fn compute(&self, targets: &[Value], predictions: &[Value]) -> Result<Scores> {
        check_aligned("bleu", targets, predictions)?;
        let references: Vec<Vec<String>> = texts("bleu", targets)?
            .into_iter()
            .map(|r| vec![r])
            .collect();
        let hypotheses = texts("bleu", predictions)?;

        let stats = self.corpus_stats(&hypotheses, &references);
        let score = self.score_from_stats(&stats);
        debug!(
            examples = hypotheses.len(),
            sys_len = stats.sys_len,
            ref_len = stats.ref_len,
            score,
            "Computed corpus BLEU"
        );
        Ok(single("bleu", score))
    }
}

/// Corpus BLEU with the default configuration.
pub fn bleu(targets: &[Value], predictions: &[Value]) -> Result<Scores> {
    Bleu::default().compute(targets, predictions)
}

/// Length of the reference closest to `hyp_len`; ties go to the shorter one.
fn closest_ref_len(hyp_len: usize, refs: &[Vec<String>]) -> usize {
    refs.iter()
        .map(Vec::len)
        .min_by_key(|len| (len.abs_diff(hyp_len), *len))
        .unwrap_or(0)
}

fn count_ngrams(tokens: &[String], max_order: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    for n in 1..=max_order {
        for window in tokens.windows(n) {
            *counts.entry(window).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BleuTokenizer;

    fn values(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::text(*s)).collect()
    }

    #[test]
    fn test_identical_corpus_scores_100() {
        let refs = values(&["this is a string", "this is a string"]);
        let scores = bleu(&refs, &refs).unwrap();
        assert!((scores["bleu"] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_identical_sentences_score_100() {
        let one_pair = values(&["hello world"]);
        assert!((bleu(&one_pair, &one_pair).unwrap()["bleu"] - 100.0).abs() < 1e-9);

        let single_words = values(&["yes", "no"]);
        assert!((bleu(&single_words, &single_words).unwrap()["bleu"] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_prediction_against_long_reference_scores_0() {
        // The reference has bigrams the prediction cannot produce.
        let refs = values(&["hello world"]);
        let preds = values(&["hello"]);
        assert_eq!(bleu(&refs, &preds).unwrap()["bleu"], 0.0);
    }

    #[test]
    fn test_empty_predictions_score_0() {
        let refs = values(&["this is a string", "this is a string"]);
        let preds = values(&["", ""]);
        assert_eq!(bleu(&refs, &preds).unwrap()["bleu"], 0.0);
    }

    #[test]
    fn test_disjoint_vocabulary_scores_0() {
        let refs = values(&["the cat sat on the mat"]);
        let preds = values(&["dogs run quickly over hills"]);
        assert_eq!(bleu(&refs, &preds).unwrap()["bleu"], 0.0);
    }

    #[test]
    fn test_exp_smoothing_gives_partial_credit() {
        let scorer = Bleu::new(BleuConfig {
            smooth_method: SmoothMethod::Exp,
            ..BleuConfig::default()
        });
        let refs = values(&["the cat sat on the mat"]);
        let preds = values(&["the dog sat on a rug"]);
        let score = scorer.compute(&refs, &preds).unwrap()["bleu"];
        assert!(score > 0.0 && score < 100.0, "got {score}");
    }

    #[test]
    fn test_clipped_counts_and_brevity_penalty() {
        let scorer = Bleu::new(BleuConfig {
            tokenize: BleuTokenizer::None,
            max_ngram_order: 1,
            ..BleuConfig::default()
        });
        let stats = scorer.corpus_stats(&["the the the the".to_string()], &[vec!["the cat".to_string()]]);
        assert_eq!(stats.correct, vec![1.0]);
        assert_eq!(stats.total, vec![4.0]);

        // Unigram precision 2/3 with a hypothesis shorter than the reference.
        let stats = scorer.corpus_stats(&["a b x".to_string()], &[vec!["a b c d".to_string()]]);
        let expected = (1.0_f64 - 4.0 / 3.0).exp() * 100.0 * 2.0 / 3.0;
        assert!((scorer.score_from_stats(&stats) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_closest_reference_length() {
        let refs = vec![
            vec!["a".to_string(); 3],
            vec!["a".to_string(); 7],
            vec!["a".to_string(); 5],
        ];
        assert_eq!(closest_ref_len(6, &refs), 5);
        assert_eq!(closest_ref_len(4, &refs), 3);
    }

    #[test]
    fn test_bytes_match_text() {
        let text = values(&["a small test sentence here"]);
        let bytes = vec![Value::bytes(b"a small test sentence here")];
        assert_eq!(bleu(&text, &text).unwrap(), bleu(&bytes, &bytes).unwrap());
    }
}
