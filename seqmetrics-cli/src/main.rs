//! seqmetrics CLI: score model predictions against references.
//!
//! Reads `{"targets": [...], "predictions": [...]}` documents and prints the
//! resulting score mapping as JSON.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Score predictions against references with BLEU, ROUGE, QA and classification metrics
#[derive(Parser, Debug)]
#[command(name = "seqmetrics", version, about, long_about = None)]
struct Cli {
    /// Workspace directory searched for `.seqmetrics/config.toml`
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path (replaces the layered lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Emit log events on stderr as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// List the available metric names
    List,
    /// Score an input file with a metric
    Score {
        /// Metric name, e.g. `bleu`, `mean_3class_f1` or `mean_group:accuracy`
        metric: String,
        /// JSON file with `targets` and `predictions` arrays (`-` for stdin)
        #[arg(short, long)]
        input: PathBuf,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose, cli.quiet)));

    // Human-readable stderr by default, structured JSON when asked for
    let (plain_layer, json_layer) = if cli.log_json {
        let json = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        (None, Some(json))
    } else {
        let plain = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        (Some(plain), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain_layer)
        .with(json_layer)
        .init();

    let config = match &cli.config {
        Some(path) => seqmetrics_core::load_config_file(path),
        None => seqmetrics_core::load_config(Some(&cli.workspace), None),
    }
    .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    commands::handle_command(cli.command, config)
}

fn default_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_json_flag() {
        let cli = Cli::try_parse_from(["seqmetrics", "--log-json", "list"]).unwrap();
        assert!(cli.log_json);
        let cli = Cli::try_parse_from(["seqmetrics", "list"]).unwrap();
        assert!(!cli.log_json);
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(0, true), "error");
        assert_eq!(default_filter(0, false), "warn");
        assert_eq!(default_filter(2, false), "debug");
        assert_eq!(default_filter(5, false), "trace");
    }
}
