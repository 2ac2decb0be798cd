//! Property-based tests for the metric functions using proptest.

use proptest::prelude::*;

use seqmetrics_core::text::normalize_answer;
use seqmetrics_core::{
    Metric, Value, accuracy, bleu, exact_match, mean_group_metric, pearson_corrcoef, qa, rouge,
    spearman_corrcoef,
};

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..12).prop_map(|words| words.join(" "))
}

fn texts(items: &[String]) -> Vec<Value> {
    items.iter().map(|s| Value::text(s.as_str())).collect()
}

fn in_percent_range(score: f64) -> bool {
    (0.0..=100.0 + 1e-9).contains(&score)
}

// --- Overlap metrics ---

proptest! {
    #[test]
    fn bleu_self_comparison_is_perfect(
        sentences in prop::collection::vec(sentence(), 1..5),
    ) {
        let refs = texts(&sentences);
        let scores = bleu(&refs, &refs).unwrap();
        prop_assert!((scores["bleu"] - 100.0).abs() < 1e-7);
    }

    #[test]
    fn bleu_is_bounded(
        pairs in prop::collection::vec((sentence(), sentence()), 1..5),
    ) {
        let (t, p): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        let scores = bleu(&texts(&t), &texts(&p)).unwrap();
        prop_assert!(in_percent_range(scores["bleu"]));
    }

    #[test]
    fn rouge_self_comparison_is_perfect(
        sentences in prop::collection::vec(sentence(), 1..5),
    ) {
        let refs = texts(&sentences);
        let scores = rouge(&refs, &refs).unwrap();
        prop_assert_eq!(scores.len(), 3);
        for (key, score) in &scores {
            prop_assert!((score - 100.0).abs() < 1e-7, "{} scored {}", key, score);
        }
    }

    #[test]
    fn rouge_is_bounded_and_deterministic(
        pairs in prop::collection::vec((sentence(), sentence()), 1..5),
    ) {
        let (t, p): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        let first = rouge(&texts(&t), &texts(&p)).unwrap();
        let second = rouge(&texts(&t), &texts(&p)).unwrap();
        prop_assert_eq!(&first, &second);
        for score in first.values() {
            prop_assert!(in_percent_range(*score));
        }
    }
}

// --- QA ---

proptest! {
    #[test]
    fn normalize_answer_is_idempotent(s in "[a-zA-Z .,!?$]{0,40}") {
        let once = normalize_answer(&s, true);
        prop_assert_eq!(normalize_answer(&once, true), once);
    }

    #[test]
    fn qa_prediction_in_answer_set_scores_perfect(
        answers in prop::collection::vec(sentence(), 1..4),
        pick in any::<prop::sample::Index>(),
    ) {
        let prediction = answers[pick.index(answers.len())].clone();
        let targets = vec![Value::list(answers)];
        let scores = qa(&targets, &[Value::text(prediction)]).unwrap();
        prop_assert_eq!(scores["em"], 100.0);
        prop_assert_eq!(scores["f1"], 100.0);
    }

    #[test]
    fn qa_f1_never_below_em(
        answers in prop::collection::vec(sentence(), 1..4),
        prediction in sentence(),
    ) {
        let scores = qa(&[Value::list(answers)], &[Value::text(prediction)]).unwrap();
        prop_assert!(scores["f1"] >= scores["em"]);
        prop_assert!(in_percent_range(scores["f1"]));
    }
}

// --- Classification and correlation ---

proptest! {
    #[test]
    fn accuracy_of_identical_labels_is_perfect(labels in prop::collection::vec(0i64..5, 1..50)) {
        let values: Vec<Value> = labels.iter().map(|l| Value::Int(*l)).collect();
        prop_assert_eq!(accuracy(&values, &values).unwrap()["accuracy"], 100.0);
        prop_assert_eq!(exact_match(&values, &values).unwrap()["exact_match"], 100.0);
    }

    #[test]
    fn correlations_are_bounded(
        pairs in prop::collection::vec((-1000i64..1000, -1000i64..1000), 2..30),
    ) {
        let t: Vec<Value> = pairs.iter().map(|(x, _)| Value::Int(*x)).collect();
        let p: Vec<Value> = pairs.iter().map(|(_, y)| Value::Int(*y)).collect();
        for scores in [pearson_corrcoef(&t, &p).unwrap(), spearman_corrcoef(&t, &p).unwrap()] {
            for score in scores.values() {
                prop_assert!((-100.0 - 1e-9..=100.0 + 1e-9).contains(score));
            }
        }
    }

    #[test]
    fn grouped_accuracy_stays_within_group_extremes(
        rows in prop::collection::vec((0u8..4, 0i64..3, 0i64..3), 1..40),
    ) {
        let targets: Vec<Value> = rows
            .iter()
            .map(|(g, t, _)| Value::record([("group", Value::Int(i64::from(*g))), ("value", Value::Int(*t))]))
            .collect();
        let predictions: Vec<Value> = rows
            .iter()
            .map(|(_, _, p)| Value::record([("value", Value::Int(*p))]))
            .collect();
        let grouped = mean_group_metric(accuracy).compute(&targets, &predictions).unwrap();
        prop_assert!(in_percent_range(grouped["accuracy"]));
    }
}
