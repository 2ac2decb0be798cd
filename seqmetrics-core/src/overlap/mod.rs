//! N-gram overlap scorers.

pub mod bleu;
pub mod rouge;

pub use bleu::{Bleu, bleu};
pub use rouge::{Rouge, RougeType, rouge};
