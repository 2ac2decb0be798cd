//! Configuration for the metric scorers.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> explicit overrides. Every section
//! has a `Default` that reproduces the standard behavior of its metric, so the
//! free functions in this crate never need a config at all.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MetricsError, Result};
use crate::value::Label;

/// Top-level metrics configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub bleu: BleuConfig,
    #[serde(default)]
    pub rouge: RougeConfig,
    #[serde(default)]
    pub qa: QaConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
}

/// Tokenizer applied to both sides before BLEU n-gram counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BleuTokenizer {
    /// Unicode-aware punctuation and symbol splitting.
    #[default]
    Intl,
    /// The mteval-v13a tokenizer.
    #[serde(rename = "13a")]
    Mteval13a,
    /// Whitespace split only.
    None,
}

/// How zero n-gram matches are smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothMethod {
    /// No smoothing; any order with zero matches drives the score to 0.
    #[default]
    None,
    /// Halve the pseudo-count for each successive order with zero matches.
    Exp,
    /// Replace zero matches with `smooth_value`.
    Floor,
    /// Add `smooth_value` to matches and totals for orders above 1.
    AddK,
}

/// Corpus BLEU configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BleuConfig {
    #[serde(default)]
    pub tokenize: BleuTokenizer,
    #[serde(default)]
    pub smooth_method: SmoothMethod,
    #[serde(default)]
    pub smooth_value: f64,
    #[serde(default)]
    pub lowercase: bool,
    #[serde(default = "default_max_ngram_order")]
    pub max_ngram_order: usize,
}

impl Default for BleuConfig {
    fn default() -> Self {
        Self {
            tokenize: BleuTokenizer::default(),
            smooth_method: SmoothMethod::default(),
            smooth_value: 0.0,
            lowercase: false,
            max_ngram_order: default_max_ngram_order(),
        }
    }
}

fn default_max_ngram_order() -> usize {
    4
}

/// ROUGE configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RougeConfig {
    /// Score keys to report: `rougeN` for any N >= 1, `rougeL` or `rougeLsum`.
    #[serde(default = "default_score_keys")]
    pub score_keys: Vec<String>,
    /// Break summaries into sentences after " . " before ROUGE-Lsum.
    #[serde(default = "default_true")]
    pub split_summaries: bool,
}

impl Default for RougeConfig {
    fn default() -> Self {
        Self {
            score_keys: default_score_keys(),
            split_summaries: true,
        }
    }
}

fn default_score_keys() -> Vec<String> {
    vec!["rouge1".into(), "rouge2".into(), "rougeLsum".into()]
}

fn default_true() -> bool {
    true
}

/// Answer normalization applied by the QA metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaConfig {
    #[serde(default = "default_true")]
    pub strip_articles: bool,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            strip_articles: true,
        }
    }
}

/// Classification metric configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Label treated as the positive class by `f1_score_with_invalid`.
    #[serde(default = "default_positive_label")]
    pub positive_label: Label,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            positive_label: default_positive_label(),
        }
    }
}

fn default_positive_label() -> Label {
    Label::Int(1)
}

/// Record keys read by the grouping wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    #[serde(default = "default_group_key")]
    pub group_key: String,
    #[serde(default = "default_value_key")]
    pub value_key: String,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            group_key: default_group_key(),
            value_key: default_value_key(),
        }
    }
}

fn default_group_key() -> String {
    "group".to_string()
}

fn default_value_key() -> String {
    "value".to_string()
}

impl MetricsConfig {
    /// Reject settings no scorer can honor.
    pub fn validate(&self) -> Result<()> {
        if self.bleu.max_ngram_order == 0 {
            return Err(MetricsError::config("bleu.max_ngram_order must be at least 1"));
        }
        if self.bleu.smooth_value < 0.0 {
            return Err(MetricsError::config("bleu.smooth_value must not be negative"));
        }
        if self.rouge.score_keys.is_empty() {
            return Err(MetricsError::config("rouge.score_keys must not be empty"));
        }
        for key in &self.rouge.score_keys {
            crate::overlap::rouge::RougeType::parse(key)?;
        }
        if self.grouping.group_key == self.grouping.value_key {
            return Err(MetricsError::config(
                "grouping.group_key and grouping.value_key must differ",
            ));
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `SEQMETRICS_`)
/// 3. Workspace-local config (`.seqmetrics/config.toml`)
/// 4. User config (`~/.config/seqmetrics/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&MetricsConfig>,
) -> Result<MetricsConfig> {
    let mut figment = Figment::from(Serialized::defaults(MetricsConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "seqmetrics", "seqmetrics") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".seqmetrics").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // SEQMETRICS_BLEU__SMOOTH_METHOD, SEQMETRICS_GROUPING__GROUP_KEY, etc.
    figment = figment.merge(Env::prefixed("SEQMETRICS_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: MetricsConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    tracing::debug!(?config, "Loaded metrics configuration");
    Ok(config)
}

/// Load a single TOML file on top of the defaults, bypassing the layered lookup.
pub fn load_config_file(path: &Path) -> Result<MetricsConfig> {
    if !path.is_file() {
        return Err(MetricsError::config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    let config: MetricsConfig = Figment::from(Serialized::defaults(MetricsConfig::default()))
        .merge(Toml::file(path))
        .extract()
        .map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}
