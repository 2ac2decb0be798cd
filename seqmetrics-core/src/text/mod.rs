//! Text normalization and tokenization shared by the scorers.

pub mod normalize;
pub mod tokenize;

pub use normalize::{normalize_answer, word_tokens};
