use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lookalike_common::observability::{LogConfig, init_logging};
use lookalike_config::{LookalikeConfigLoader, TaskConfig, default_config_path};
use lookalike_app::build_from_config;
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lookalike", version, about = "Detect near-duplicate web pages")]
struct Cli {
    /// YAML configuration file (default: ./lookalike.yaml, then the user config dir)
    #[arg(long, global = true, env = "LOOKALIKE_CONFIG")]
    config: Option<PathBuf>,

    /// Duplicate log output to stderr
    #[arg(long, global = true)]
    log_stderr: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare two pages and print the verdict as JSON
    Compare { url_a: String, url_b: String },
    /// Print the feature vector(s) of one page as JSON
    Features { url: String },
    /// Print the effective configuration with secrets redacted
    Config,
}

fn load_config(path: Option<PathBuf>) -> Result<TaskConfig> {
    let loader = LookalikeConfigLoader::new();
    let loader = match path.or_else(default_config_path) {
        Some(path) => loader.with_file(path),
        None => loader,
    };
    loader.load().context("failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg = load_config(cli.config)?;

    // 2) Logging from the config's logging section
    let log_file = init_logging(LogConfig {
        app_name: "lookalike",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cli.log_stderr || cfg.logging.stderr,
        format: cfg.logging.format,
        level: cfg.logging.level.clone(),
    })?;
    tracing::debug!(log_file = %log_file.display(), "app.logging.ready");

    match cli.command {
        Command::Config => {
            print!("{}", cfg.to_redacted_yaml()?);
        }
        Command::Compare { url_a, url_b } => {
            let pipeline = build_from_config(&cfg)?;
            let verdict = pipeline.compare(&url_a, &url_b).await;
            let out = json!({
                "similar": verdict.similar,
                "score": verdict.score,
                "method": pipeline.method().as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Features { url } => {
            let pipeline = build_from_config(&cfg)?;
            let features = pipeline
                .page_features(&url)
                .await
                .with_context(|| format!("failed to extract features of {url}"))?;
            let out = json!({
                "url": url,
                "method": pipeline.method().as_str(),
                "features": features,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}
