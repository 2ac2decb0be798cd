//! Assertion helpers for comparing score mappings in tests.

use crate::metric::Scores;

/// Default tolerance for [`assert_scores_close`].
pub const DEFAULT_DELTA: f64 = 1e-7;

/// Assert that `actual` has exactly the keys of `expected`, each within `delta`.
///
/// Panics with the offending key on mismatch.
#[track_caller]
pub fn assert_scores_close(actual: &Scores, expected: &[(&str, f64)], delta: f64) {
    let mut actual_keys: Vec<&str> = actual.keys().map(String::as_str).collect();
    let mut expected_keys: Vec<&str> = expected.iter().map(|(k, _)| *k).collect();
    actual_keys.sort_unstable();
    expected_keys.sort_unstable();
    assert_eq!(actual_keys, expected_keys, "score keys differ");

    for (key, want) in expected {
        let got = actual[*key];
        assert!(
            (got - want).abs() <= delta,
            "{got} != {want} within {delta} for key '{key}'"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_scores_pass() {
        let scores = Scores::from([("em".to_string(), 50.0), ("f1".to_string(), 50.00000001)]);
        assert_scores_close(&scores, &[("f1", 50.0), ("em", 50.0)], DEFAULT_DELTA);
    }

    #[test]
    #[should_panic(expected = "for key 'f1'")]
    fn test_far_scores_panic() {
        let scores = Scores::from([("f1".to_string(), 40.0)]);
        assert_scores_close(&scores, &[("f1", 50.0)], DEFAULT_DELTA);
    }

    #[test]
    #[should_panic(expected = "score keys differ")]
    fn test_missing_key_panics() {
        let scores = Scores::from([("f1".to_string(), 50.0)]);
        assert_scores_close(&scores, &[("f1", 50.0), ("em", 50.0)], DEFAULT_DELTA);
    }
}
