mod config;
mod discovery;
mod engine;
mod evaluator;
mod executor;
mod extractor;
mod invocation;


use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::RunnerConfig;
use engine::ProcessEngine;
use executor::{PackageRunner, RunOptions};
use extractor::PatternExtractor;
use invocation::EnvSnapshot;
use peace_common::types::{PackageReport, RunSummary};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "peace")]
#[command(about = "peace - run every test of a Go package in its own process", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run each discovered test in isolation and print the package report
    Run {
        #[command(flatten)]
        target: PackageArgs,

        /// Suppress progress logging
        #[arg(short, long, default_value = "false")]
        quiet: bool,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List discovered tests and the command each would run, without running them
    List {
        #[command(flatten)]
        target: PackageArgs,
    },
}

#[derive(Args)]
struct PackageArgs {
    /// Package path, relative to <source-root>/src
    package: String,

    /// Build tags, passed as a single token (join several with commas)
    #[arg(short, long, default_value = "")]
    tags: String,

    /// Runner config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Workspace root holding src/<package>
    #[arg(long, env = "GOPATH")]
    source_root: Option<PathBuf>,

    /// Toolchain executable
    #[arg(long, env = "PEACE_TOOLCHAIN")]
    toolchain: Option<String>,

    /// Per-test timeout in milliseconds (default: wait indefinitely)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl PackageArgs {
    /// Defaults, then the config file, then flags and their env fallbacks
    fn resolve_config(&self) -> Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::load(path)?,
            None => RunnerConfig::default(),
        };

        if let Some(root) = &self.source_root {
            config.source_root = Some(root.clone());
        }
        if let Some(toolchain) = &self.toolchain {
            config.toolchain = toolchain.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = Some(timeout_ms);
        }

        config.validate()?;
        Ok(config)
    }

    fn runner(&self) -> Result<PackageRunner<PatternExtractor, ProcessEngine>> {
        let config = self.resolve_config()?;
        debug!(?config, "Runner configuration");

        let engine = ProcessEngine::new(config.timeout());
        Ok(PackageRunner::new(
            config,
            PatternExtractor::new()?,
            engine,
            EnvSnapshot::capture(),
        ))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a PackageReport,
    summary: RunSummary,
}

fn summary_line(summary: &RunSummary) -> String {
    format!(
        "{} passed, {} failed, {} panicked in {:.2}s",
        summary.passed,
        summary.failed,
        summary.panicked,
        summary.duration_ms as f64 / 1000.0
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { target, quiet, format } => {
            let runner = target.runner()?;
            let options = RunOptions {
                tags: target.tags.clone(),
                logging: !quiet,
            };

            let report = runner.run(&target.package, &options).await.map_err(|e| {
                error!(package = %target.package, error = %e, "Run aborted");
                e
            })?;
            let summary = report.summary();

            match format {
                OutputFormat::Text => {
                    print!("{}", report);
                    println!("{}", summary_line(&summary));
                }
                OutputFormat::Json => {
                    let json = JsonReport {
                        report: &report,
                        summary,
                    };
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
            }

            if !summary.all_passed() {
                std::process::exit(1);
            }
        }
        Commands::List { target } => {
            let runner = target.runner()?;
            let options = RunOptions {
                tags: target.tags.clone(),
                logging: false,
            };

            let requests = runner.plan(&target.package, &options).await?;
            println!("{}: [{}]", target.package, requests.len());
            for request in &requests {
                println!("{}\t{}", request.name(), request.command_line());
            }
        }
    }

    Ok(())
}
