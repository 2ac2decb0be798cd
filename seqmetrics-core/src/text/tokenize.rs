//! Tokenizers for the n-gram overlap scorers.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::BleuTokenizer;

static INTL_NONDIGIT_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^\d])(\p{P})").expect("intl pattern is valid"));
static INTL_PUNCT_NONDIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{P})([^\d])").expect("intl pattern is valid"));
static INTL_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{S})").expect("intl pattern is valid"));

static V13A_PUNCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\{-~\[-` -&\(-\+:-@/])").expect("13a pattern is valid")
});
static V13A_NONDIGIT_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^0-9])([\.,])").expect("13a pattern is valid"));
static V13A_PERIOD_NONDIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\.,])([^0-9])").expect("13a pattern is valid"));
static V13A_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9])(-)").expect("13a pattern is valid"));

static ROUGE_NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("rouge pattern is valid"));

/// Tokenize a line for BLEU with the configured tokenizer.
pub fn bleu_tokens(line: &str, tokenizer: BleuTokenizer, lowercase: bool) -> Vec<String> {
    let line = if lowercase {
        line.to_lowercase()
    } else {
        line.to_string()
    };
    let tokenized = match tokenizer {
        BleuTokenizer::Intl => tokenize_intl(&line),
        BleuTokenizer::Mteval13a => tokenize_13a(&line),
        BleuTokenizer::None => line,
    };
    tokenized.split_whitespace().map(str::to_string).collect()
}

/// Split punctuation off words unless it sits next to a digit, and isolate symbols.
fn tokenize_intl(line: &str) -> String {
    let line = INTL_NONDIGIT_PUNCT.replace_all(line, "${1} ${2} ");
    let line = INTL_PUNCT_NONDIGIT.replace_all(&line, " ${1} ${2}");
    INTL_SYMBOL.replace_all(&line, " ${1} ").into_owned()
}

/// The mteval-v13a tokenizer.
fn tokenize_13a(line: &str) -> String {
    let mut line = line
        .replace("<skipped>", "")
        .replace("-\n", "")
        .replace('\n', " ");
    if line.contains('&') {
        line = line
            .replace("&quot;", "\"")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">");
    }
    let line = format!(" {line} ");
    let line = V13A_PUNCT.replace_all(&line, " ${1} ");
    let line = V13A_NONDIGIT_PERIOD.replace_all(&line, "${1} ${2} ");
    let line = V13A_PERIOD_NONDIGIT.replace_all(&line, " ${1} ${2}");
    V13A_DASH.replace_all(&line, "${1} ${2} ").into_owned()
}

/// Tokenize for ROUGE: lowercase and keep only runs of ASCII letters and digits.
pub fn rouge_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    ROUGE_NON_ALNUM
        .replace_all(&lowered, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intl_splits_punctuation() {
        assert_eq!(
            bleu_tokens("Hello, world!", BleuTokenizer::Intl, false),
            vec!["Hello", ",", "world", "!"]
        );
    }

    #[test]
    fn test_intl_keeps_decimal_numbers() {
        assert_eq!(
            bleu_tokens("costs 3.50 now", BleuTokenizer::Intl, false),
            vec!["costs", "3.50", "now"]
        );
    }

    #[test]
    fn test_intl_isolates_symbols() {
        assert_eq!(
            bleu_tokens("a+b", BleuTokenizer::Intl, false),
            vec!["a", "+", "b"]
        );
    }

    #[test]
    fn test_13a_tokenizer() {
        assert_eq!(
            bleu_tokens("It costs $5, ok.", BleuTokenizer::Mteval13a, false),
            vec!["It", "costs", "$", "5", ",", "ok", "."]
        );
        assert_eq!(
            bleu_tokens("a &amp; b", BleuTokenizer::Mteval13a, false),
            vec!["a", "&", "b"]
        );
    }

    #[test]
    fn test_lowercase_and_none() {
        assert_eq!(
            bleu_tokens("Hello, World", BleuTokenizer::None, true),
            vec!["hello,", "world"]
        );
    }

    #[test]
    fn test_rouge_tokens() {
        assert_eq!(
            rouge_tokens("This ~ is a String!"),
            vec!["this", "is", "a", "string"]
        );
        assert!(rouge_tokens("$$$").is_empty());
    }
}
