//! Bubble CLI — compute the index, serve the dashboard, or run a command.
//!
//! Commands:
//! - `compute`: fetch all series, compose the index, write snapshot + history, exit
//! - `serve`: run `compute`, then serve a directory over HTTP
//! - anything else: executed as an external command; its exit status is propagated

mod serve;

use anyhow::{Context, Result};
use bubble_core::data::live_sources;
use bubble_core::ScoringConfig;
use bubble_runner::{
    run_compute, AppConfig, ComputeOptions, RunOutcome, DEFAULT_HISTORY_PATH,
    DEFAULT_SNAPSHOT_PATH,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bubble",
    version,
    about = "Bubble index: daily composite of equity, volatility, financial-conditions and IPO series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the index once and write the snapshot and history.
    Compute(ComputeArgs),
    /// Compute the index, then serve a directory over HTTP.
    Serve {
        #[command(flatten)]
        compute: ComputeArgs,

        /// Directory to serve. Defaults to the working directory.
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Address to bind.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to bind. Overrides `PORT`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run an arbitrary command.
    #[command(external_subcommand)]
    Exec(Vec<OsString>),
}

#[derive(Args, Clone)]
struct ComputeArgs {
    /// Snapshot output path.
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
    snapshot: PathBuf,

    /// History CSV path.
    #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
    history: PathBuf,

    /// TOML file overriding anchors, weights and band thresholds.
    #[arg(long)]
    scoring: Option<PathBuf>,

    /// Date to record the run under (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    as_of: Option<String>,

    /// Abort on any fetch failure instead of substituting placeholders.
    #[arg(long, default_value_t = false)]
    no_placeholders: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compute(args) => {
            let config = AppConfig::from_env().context("invalid environment configuration")?;
            run_compute_cmd(&args, &config)?;
            Ok(())
        }
        Commands::Serve {
            compute,
            root,
            host,
            port,
        } => {
            let config = AppConfig::from_env().context("invalid environment configuration")?;
            run_compute_cmd(&compute, &config)?;

            let port = port.unwrap_or(config.port);
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(serve::serve_dir(&root, &host, port))
        }
        Commands::Exec(args) => {
            let code = run_passthrough(&args)?;
            std::process::exit(code);
        }
    }
}

fn run_compute_cmd(args: &ComputeArgs, config: &AppConfig) -> Result<RunOutcome> {
    let scoring = match &args.scoring {
        Some(path) => ScoringConfig::from_file(path)
            .with_context(|| format!("failed to load scoring config {}", path.display()))?,
        None => ScoringConfig::default(),
    };

    let as_of = args
        .as_of
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--as-of must be YYYY-MM-DD")?
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let opts = ComputeOptions {
        snapshot_path: args.snapshot.clone(),
        history_path: args.history.clone(),
        scoring,
        allow_placeholders: config.allow_placeholders && !args.no_placeholders,
        as_of,
    };

    let sources =
        live_sources(&config.provider_settings()).context("failed to set up data providers")?;
    let outcome = run_compute(&sources, &opts).context("bubble index computation failed")?;

    print_summary(&outcome, &opts);
    Ok(outcome)
}

fn run_passthrough(args: &[OsString]) -> Result<i32> {
    let (program, rest) = args.split_first().context("no command given")?;
    tracing::info!(command = ?program, "running passthrough command");
    let status = Command::new(program)
        .args(rest)
        .status()
        .with_context(|| format!("failed to execute {}", program.to_string_lossy()))?;
    // Killed by a signal: no exit code; report generic failure
    Ok(status.code().unwrap_or(1))
}

fn print_summary(outcome: &RunOutcome, opts: &ComputeOptions) {
    let index = &outcome.index;
    println!();
    println!("=== Bubble Index ===");
    println!("As of:          {}", index.as_of);
    println!("Score:          {:.2}", index.score);
    println!("Band:           {}", index.band);
    println!();
    println!("{:<22} {:>12} {:>10} {:>8}", "Series", "Raw", "Score", "Weight");
    println!("{}", "-".repeat(56));
    for sub in &index.breakdown {
        let marker = if sub.is_placeholder { " (placeholder)" } else { "" };
        println!(
            "{:<22} {:>12.4} {:>10.2} {:>8.2}{marker}",
            sub.series.as_str(),
            sub.raw,
            sub.normalized,
            sub.weight
        );
    }
    if index.placeholder_count() > 0 {
        println!();
        println!(
            "WARNING: {} of {} series use placeholder values",
            index.placeholder_count(),
            index.breakdown.len()
        );
    }
    println!();
    println!("Snapshot:       {}", opts.snapshot_path.display());
    println!(
        "History:        {} ({} rows, {:?})",
        opts.history_path.display(),
        outcome.history_rows,
        outcome.history_upsert
    );
}
