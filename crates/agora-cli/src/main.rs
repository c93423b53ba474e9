//! Agora command-line interface
//!
//! Runs the marketplace pipeline for a single request and streams progress
//! to stdout. Stores live under a data directory; the generator backend is
//! selected by flag or environment.

use std::path::PathBuf;
use std::sync::Arc;

use agora_llm::{CannedProvider, Generator, OllamaProvider};
use agora_settlement::{EventStatus, MarketPipeline};
use agora_store::{EscrowLedger, ReputationStore};
use agora_types::LedgerEntry;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "agora", version, about = "Agora task marketplace")]
struct Cli {
    /// Directory holding the escrow ledger and reputation database
    #[arg(long, env = "AGORA_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Generator backend
    #[arg(long, env = "AGORA_LLM_PROVIDER", value_enum, default_value_t = Provider::Ollama)]
    provider: Provider,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Provider {
    /// Local Ollama instance (AGORA_LLM_BASE_URL, AGORA_LLM_MODEL)
    Ollama,
    /// Deterministic demo fixtures, no LLM required
    Canned,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the marketplace for one request
    Run {
        /// The request, in plain words
        request: Vec<String>,
    },
    /// Print the settlement history from the escrow ledger
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tokio::fs::create_dir_all(&cli.data_dir).await?;
    let ledger = Arc::new(EscrowLedger::open(cli.data_dir.join("escrow_ledger.json")).await?);
    let reputation =
        Arc::new(ReputationStore::open(cli.data_dir.join("reputation_db.json")).await?);

    match cli.command {
        Command::Run { request } => {
            let request = request.join(" ");
            if request.trim().is_empty() {
                anyhow::bail!("empty request; describe the task in plain words");
            }
            let generator = build_generator(cli.provider).await;
            let pipeline = MarketPipeline::new(generator, ledger, reputation);

            let stream = pipeline.run_stream(request);
            futures::pin_mut!(stream);
            let mut succeeded = false;
            while let Some(event) = stream.next().await {
                println!("{}", event.summary());
                if event.is_final() {
                    succeeded = event.status == EventStatus::Success;
                }
            }
            if !succeeded {
                std::process::exit(1);
            }
        }
        Command::History => {
            for entry in ledger.history().await {
                println!("{}", format_history_entry(&entry));
            }
        }
    }
    Ok(())
}

/// One settlement per line: status, contract, amount, recipient, lock time.
fn format_history_entry(entry: &LedgerEntry) -> String {
    let recipient = entry
        .recipient
        .as_ref()
        .map(|w| w.as_str())
        .unwrap_or("-");
    format!(
        "{:?}\t{}\t${}\t{}\t{}",
        entry.status,
        entry.contract_id,
        entry.amount,
        recipient,
        entry.locked_at.to_rfc3339(),
    )
}

async fn build_generator(provider: Provider) -> Arc<dyn Generator> {
    match provider {
        Provider::Ollama => {
            let ollama = OllamaProvider::from_env();
            if !ollama.is_available().await {
                warn!("ollama is not reachable; the run will fail at the first generation");
            }
            Arc::new(ollama)
        }
        Provider::Canned => Arc::new(demo_fixtures().await),
    }
}

/// A pre-queued fixture run so `--provider canned` demonstrates the full
/// pipeline offline: three bids at {60, 95, 150} against a 100 budget, a
/// passing validation, and a release to the cheapest worker.
async fn demo_fixtures() -> CannedProvider {
    let provider = CannedProvider::new();
    provider
        .push(
            r#"{"description": "Write a short poem about coding", "acceptance_criteria": ["Rhymes", "Mentions coding"], "budget": 100.0, "deadline": "in one week"}"#,
        )
        .await;
    for (price, timeline) in [(60.0, "1 day"), (95.0, "4 days"), (150.0, "1 week")] {
        provider
            .push(format!(
                r#"{{"price": {}, "timeline": "{}", "confidence": 0.8, "plan": "Draft, revise, deliver."}}"#,
                price, timeline
            ))
            .await;
    }
    provider
        .push(
            r#"{"deliverables": ["Draft poem", "Final poem"], "tests": ["Rhymes", "Mentions coding"], "penalty_rules": ["10% reduction per late day"]}"#,
        )
        .await;
    provider
        .push("Roses are red, my tests are green,\nthe cleanest diff you've ever seen.")
        .await;
    provider
        .push(r#"{"passed": true, "score": 88.0, "issues": [], "retry_allowed": false}"#)
        .await;
    provider
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{ContractId, FundsStatus, TaskId, WorkerId};

    #[test]
    fn test_history_line_shows_recipient_and_status() {
        let mut entry = LedgerEntry::locked(ContractId::new(), 60.0, TaskId::new());
        entry.status = FundsStatus::Released;
        entry.recipient = Some(WorkerId::new("worker_fast_cheap"));

        let line = format_history_entry(&entry);
        assert!(line.starts_with("Released\t"));
        assert!(line.contains("$60"));
        assert!(line.contains("worker_fast_cheap"));
    }

    #[test]
    fn test_refund_line_has_placeholder_recipient() {
        let mut entry = LedgerEntry::locked(ContractId::new(), 80.0, TaskId::new());
        entry.status = FundsStatus::Refunded;

        let line = format_history_entry(&entry);
        assert!(line.contains("\t-\t"));
    }
}
