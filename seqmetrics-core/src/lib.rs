//! # seqmetrics-core: evaluation metrics for model outputs
//!
//! Every metric scores a sequence of predictions against an aligned sequence
//! of targets and returns a mapping from score name to value:
//!
//! - **Overlap**: corpus BLEU, ROUGE-N / ROUGE-L / ROUGE-Lsum
//! - **QA**: normalized exact match and token F1, span-decoded QA
//! - **Classification**: accuracy, exact match, sequence accuracy, binary F1
//!   with invalid predictions, macro F1
//! - **Correlation**: Pearson, Spearman, Matthews
//! - **Grouping**: any metric averaged per group
//!
//! Scores are percentages; correlations are coefficients ×100.

pub mod classification;
pub mod config;
pub mod correlation;
pub mod error;
pub mod grouping;
pub mod metric;
pub mod overlap;
pub mod qa;
pub mod registry;
pub mod testing;
pub mod text;
pub mod value;

pub use classification::{
    F1WithInvalid, MeanMulticlassF1, accuracy, exact_match, f1_score_with_invalid,
    mean_multiclass_f1, sequence_accuracy,
};
pub use config::{MetricsConfig, load_config, load_config_file};
pub use correlation::{matthews_corrcoef, pearson_corrcoef, spearman_corrcoef};
pub use error::{MetricsError, Result};
pub use grouping::{MeanGroupMetric, mean_group_metric};
pub use metric::{Metric, Scores};
pub use overlap::{Bleu, Rouge, bleu, rouge};
pub use qa::{Qa, SpanQa, decode_span, qa, span_qa};
pub use registry::MetricRegistry;
pub use value::{Label, Value};
