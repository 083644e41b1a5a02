//! Command-line front end: load preference tables, run the matching,
//! stream events, print the final table.

use std::path::PathBuf;
use std::time::Duration;

use actors::{CoordinatorArgs, CoordinatorConfig, CoordinatorMessage, start_coordinator};
use anyhow::Context;
use clap::Parser;
use matching_core::{PreferenceTable, ProposerId, ReviewerId, validate_tables};
use serde::Deserialize;

/// Compute a stable matching between two groups with an actor
/// population running deferred acceptance.
#[derive(Parser)]
#[command(name = "stable-match", version)]
struct Cli {
    /// JSON file with "proposers" and "reviewers" preference tables.
    input: PathBuf,

    /// Idle window in milliseconds before declaring quiescence.
    #[arg(long, default_value_t = 100)]
    idle_ms: u64,
}

/// On-disk input format: two tables, each mapping an id to an ordered
/// preference list over the opposite group.
#[derive(Deserialize)]
struct InputTables {
    proposers: PreferenceTable<ProposerId, ReviewerId>,
    reviewers: PreferenceTable<ReviewerId, ProposerId>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let tables: InputTables = serde_json::from_str(&raw).context("parsing preference tables")?;
    validate_tables(&tables.proposers, &tables.reviewers)?;

    let (coordinator, _handle) = start_coordinator(CoordinatorArgs {
        proposer_prefs: tables.proposers,
        reviewer_prefs: tables.reviewers,
        config: CoordinatorConfig {
            idle_timeout: Duration::from_millis(cli.idle_ms),
        },
    })
    .await?;

    // Stream events to stdout as they occur.
    let (events_tx, mut events_rx) = tokio::sync::broadcast::channel(1024);
    coordinator
        .send_message(CoordinatorMessage::Subscribe { sender: events_tx })
        .map_err(|e| anyhow::anyhow!("subscribing: {e}"))?;
    let printer = tokio::spawn(async move {
        while let Ok(event) = events_rx.recv().await {
            println!(
                "[{}] {}",
                event.timestamp().format("%H:%M:%S%.3f"),
                event.description()
            );
        }
    });

    coordinator
        .send_message(CoordinatorMessage::Launch)
        .map_err(|e| anyhow::anyhow!("launching: {e}"))?;

    let (tx, rx) = actors::concurrency::oneshot();
    coordinator
        .send_message(CoordinatorMessage::AwaitResult { reply: tx.into() })
        .map_err(|e| anyhow::anyhow!("awaiting result: {e}"))?;
    let outcome = rx.await.context("coordinator dropped the result")?;

    println!("\nFinal matching ({} pairs):", outcome.matches.len());
    let mut pairs: Vec<_> = outcome.matches.iter().collect();
    pairs.sort_by_key(|(proposer, _)| proposer.as_str().to_string());
    for (proposer, reviewer) in pairs {
        println!("  {proposer} -> {reviewer}");
    }
    if !outcome.impossible.is_empty() {
        println!("Unmatched after exhausting their lists:");
        for proposer in &outcome.impossible {
            println!("  {proposer}");
        }
    }

    let _ = coordinator.send_message(CoordinatorMessage::Shutdown);
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;

    Ok(())
}
