//! Answer normalization for exact-match and token-F1 scoring.

use regex::Regex;
use std::sync::LazyLock;

static ARTICLES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(a|an|the)\b").expect("article pattern is valid"));

/// Lowercase, drop ASCII punctuation, remove articles and collapse whitespace.
///
/// `"a big  Moose!"` becomes `"big moose"`.
pub fn normalize_answer(text: &str, strip_articles: bool) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    let without_articles = if strip_articles {
        ARTICLES.replace_all(&stripped, " ")
    } else {
        stripped.as_str().into()
    };
    word_tokens(&without_articles).join(" ")
}

/// Whitespace tokenization.
pub fn word_tokens(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
