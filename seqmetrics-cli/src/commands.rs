//! Subcommand handlers.

use anyhow::Context;
use serde::Deserialize;
use std::io::{Read, Write};
use std::path::Path;

use seqmetrics_core::{MetricRegistry, MetricsConfig, Scores, Value};

use crate::Commands;

/// Input document for `seqmetrics score`.
#[derive(Debug, Deserialize)]
pub(crate) struct ScoreInput {
    pub targets: Vec<Value>,
    pub predictions: Vec<Value>,
}

pub(crate) fn handle_command(command: Commands, config: MetricsConfig) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::List => {
            let registry = MetricRegistry::new(config)?;
            for name in registry.names() {
                writeln!(out, "{name}")?;
            }
            writeln!(out, "mean_<N>class_f1")?;
            writeln!(out, "mean_group:<metric>")?;
        }
        Commands::Score {
            metric,
            input,
            pretty,
        } => {
            let registry = MetricRegistry::new(config)?;
            let document = read_input(&input)?;
            let scores = score(&registry, &metric, &document)?;
            let rendered = if pretty {
                serde_json::to_string_pretty(&scores)?
            } else {
                serde_json::to_string(&scores)?
            };
            writeln!(out, "{rendered}")?;
        }
        Commands::Config => {
            writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
        }
    }
    Ok(())
}

pub(crate) fn read_input(path: &Path) -> anyhow::Result<String> {
    let mut raw = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read input from stdin")?;
    } else {
        raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }
    Ok(raw)
}

pub(crate) fn score(registry: &MetricRegistry, metric: &str, document: &str) -> anyhow::Result<Scores> {
    let input: ScoreInput =
        serde_json::from_str(document).context("Input must be {\"targets\": [...], \"predictions\": [...]}")?;
    tracing::info!(
        metric,
        examples = input.targets.len(),
        "Scoring predictions"
    );
    let scores = registry
        .compute(metric, &input.targets, &input.predictions)
        .with_context(|| format!("Metric '{metric}' failed"))?;
    Ok(scores)
}
