//! pharmachain - prescription reminders and ledger verification from the terminal.

use std::future::Future;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pharmachain_core::config::PharmaConfig;
use pharmachain_core::IdKind;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "pharmachain")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to pharmachain.toml (falls back to PHARMACHAIN_CONFIG, then
    /// ~/.pharmachain/pharmachain.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the bare id behind a scanned link or typed code
    Resolve {
        input: String,

        #[arg(long, default_value_t = IdKind::Prescription)]
        kind: IdKind,

        /// Also look the record up on the backend
        #[arg(long)]
        check: bool,
    },

    /// Print the share link encoded into QR codes
    Link {
        id: String,

        #[arg(long, default_value_t = IdKind::Prescription)]
        kind: IdKind,
    },

    /// Show when each reminder time fires next
    Next {
        /// Comma-separated HH:MM list
        #[arg(long, conflicts_with = "frequency")]
        times: Option<String>,

        /// Doses per day (1-4), using the default time preset
        #[arg(long)]
        frequency: Option<u32>,
    },

    /// Fetch and print a prescription or patient record as JSON
    Show {
        input: String,

        #[arg(long, default_value_t = IdKind::Prescription)]
        kind: IdKind,
    },

    /// Check a prescription's data hash against the ledger
    Verify { input: String },

    /// Run reminders for a prescription until Ctrl-C
    Remind {
        /// Prescription link or id (omit when using --name and --times)
        input: Option<String>,

        /// Local schedule instead of fetching: comma-separated HH:MM list
        #[arg(long)]
        times: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value = "")]
        dosage: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pharmachain=info".into()),
        )
        .init();

    let cli = Cli::parse();
    block_on_detached(run(cli))?
}

/// Run `fut` on a fresh multi-thread runtime, then shut it down without
/// waiting on blocking tasks.
///
/// A pending console permission prompt sits in a blocking stdin read that
/// Ctrl-C cannot interrupt; a plain runtime drop would wait for it.
fn block_on_detached<F: Future>(fut: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(fut);
    runtime.shutdown_background();
    Ok(output)
}

async fn run(cli: Cli) -> Result<()> {
    // load config: explicit path > PHARMACHAIN_CONFIG env > ~/.pharmachain/pharmachain.toml
    let config = PharmaConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        PharmaConfig::default()
    });

    match cli.command {
        Commands::Resolve { input, kind, check } => {
            commands::resolve(&config, &input, kind, check).await
        }
        Commands::Link { id, kind } => commands::link(&config, &id, kind),
        Commands::Next { times, frequency } => commands::next(times.as_deref(), frequency),
        Commands::Show { input, kind } => commands::show(&config, &input, kind).await,
        Commands::Verify { input } => commands::verify(&config, &input).await,
        Commands::Remind {
            input,
            times,
            name,
            dosage,
        } => commands::remind(&config, input.as_deref(), name, times, &dosage).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn shutdown_does_not_wait_for_a_blocked_prompt() {
        // Stands in for a stdin read nobody answers.
        let (answer_tx, answer_rx) = std::sync::mpsc::channel::<()>();
        let started = Instant::now();

        let output = block_on_detached(async move {
            tokio::task::spawn_blocking(move || {
                let _ = answer_rx.recv();
            });
            tokio::task::yield_now().await;
            "stopped"
        })
        .unwrap();

        assert_eq!(output, "stopped");
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(answer_tx);
    }
}
