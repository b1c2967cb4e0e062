//! CryptoPix risk CLI
//!
//! Analyzes a transaction file against a policy and a watchlist, or checks
//! a policy file for definitions that would be skipped.

use anyhow::Context;
use clap::{Parser, Subcommand};
use cryptopix_risk_core::policy::{describe, PolicySnapshot, PolicyStore};
use cryptopix_risk_core::{
    Analyzer, AnalyzerSettings, InMemoryResultStore, JsonLinesResultStore, ResultStore,
    WatchlistScreener,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "cryptopix-risk")]
#[command(version, about = "Risk analysis for crypto-to-Pix transactions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one transaction and print the result as JSON
    Analyze {
        /// Policy file (flag definitions and risk triggers)
        #[arg(short, long)]
        policy: PathBuf,

        /// Watchlist file (reputation provider lists)
        #[arg(short, long)]
        watchlist: PathBuf,

        /// Transaction request JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Append the result to this JSON-lines store
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// Report policy definitions that would be skipped
    CheckPolicy {
        #[arg(short, long)]
        policy: PathBuf,
    },
}

/// Filter from RUST_LOG, then LOG_LEVEL, else `default_level`
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing("info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            policy,
            watchlist,
            input,
            store,
        } => cmd_analyze(&policy, &watchlist, &input, store.as_deref()).await,
        Commands::CheckPolicy { policy } => cmd_check_policy(&policy),
    }
}

async fn cmd_analyze(
    policy: &Path,
    watchlist: &Path,
    input: &Path,
    store: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let settings = AnalyzerSettings::from_env().context("invalid analyzer settings")?;

    let loaded = PolicySnapshot::from_file(policy)
        .with_context(|| format!("failed to load policy {}", policy.display()))?;
    let screener = WatchlistScreener::from_file(watchlist)
        .with_context(|| format!("failed to load watchlist {}", watchlist.display()))?;

    let results: Arc<dyn ResultStore> = match store {
        Some(path) => Arc::new(
            JsonLinesResultStore::open(path)
                .await
                .with_context(|| format!("failed to open result store {}", path.display()))?,
        ),
        None => Arc::new(InMemoryResultStore::new()),
    };

    let policies = Arc::new(PolicyStore::new(loaded.snapshot));
    info!(fingerprint = %policies.snapshot().fingerprint(), "Policy loaded");

    let analyzer = Analyzer::new(Arc::new(screener), policies, results, settings);

    let request = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read transaction {}", input.display()))?;
    let outcome = analyzer
        .analyze_json(&request)
        .await
        .context("analysis failed")?;

    for warning in &outcome.warnings {
        warn!("{warning}");
    }
    println!("{}", serde_json::to_string_pretty(&outcome.result)?);

    Ok(ExitCode::SUCCESS)
}

fn cmd_check_policy(policy: &Path) -> anyhow::Result<ExitCode> {
    let loaded = PolicySnapshot::from_file(policy)
        .with_context(|| format!("failed to load policy {}", policy.display()))?;

    let mut problems = loaded.rejected;
    problems.extend(loaded.snapshot.issues());

    println!(
        "{} flag definitions, {} risk triggers, fingerprint {}",
        loaded.snapshot.flags.len(),
        loaded.snapshot.triggers.len(),
        loaded.snapshot.fingerprint()
    );

    if problems.is_empty() {
        println!("No problems found.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} definitions will be skipped:", problems.len());
    for problem in &problems {
        println!("  - {problem}");
    }
    info!(summary = %describe(&problems), "Policy check finished");

    Ok(ExitCode::FAILURE)
}
