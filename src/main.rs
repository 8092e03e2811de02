//! Command-line front end for the debate arena.
//!
//! ```bash
//! # List selectable cases
//! debate-arena cases
//!
//! # Backend health and default model
//! debate-arena health
//!
//! # Stream a debate for case row 4
//! debate-arena run --row-id 4 --rebuttals 2
//! ```

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use debate_arena::catalog::{self, SNIPPET_WIDTH};
use debate_arena::protocol::types::StartCommand;
use debate_arena::session::StateChange;
use debate_arena::{ArenaConfig, ConnectionStatus, DebateClient, WsConnector};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides ARENA_URL).
    #[arg(long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List selectable cases from the backend catalog.
    Cases,
    /// Show backend health and the default model.
    Health,
    /// Run a debate and stream it to the terminal.
    Run {
        /// Case row to debate. Defaults to the catalog's preferred case.
        #[arg(long)]
        row_id: Option<i64>,

        /// Model override (default: backend's default model).
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature.
        #[arg(long, default_value_t = 0.2)]
        temperature: f64,

        /// Rebuttal rounds after the opening statements.
        #[arg(long, default_value_t = 1)]
        rebuttals: u32,

        /// Optional per-turn token cap.
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Replace the catalog row's claim with this text.
        #[arg(long)]
        claim_override: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ArenaConfig::default();
    if let Some(url) = cli.url {
        config.base_url = url;
    }

    match cli.command {
        Command::Cases => list_cases(&config).await,
        Command::Health => show_health(&config).await,
        Command::Run {
            row_id,
            model,
            temperature,
            rebuttals,
            max_tokens,
            claim_override,
        } => {
            run_debate(
                &config,
                row_id,
                model,
                temperature,
                rebuttals,
                max_tokens,
                claim_override,
            )
            .await
        }
    }
}

async fn list_cases(config: &ArenaConfig) -> Result<()> {
    let http = reqwest::Client::new();
    let catalog = catalog::fetch_cases(&http, &config.base_url)
        .await
        .context("fetching case catalog")?;

    if catalog.cases.is_empty() {
        println!("No cases available.");
        return Ok(());
    }

    for case in &catalog.cases {
        let star = if case.is_default { "★" } else { " " };
        println!(
            "{star} row {:>4}  {}",
            case.row_id,
            catalog::snippet(&case.claim, SNIPPET_WIDTH)
        );
    }
    Ok(())
}

async fn show_health(config: &ArenaConfig) -> Result<()> {
    let http = reqwest::Client::new();
    let health = catalog::fetch_health(&http, &config.base_url)
        .await
        .context("fetching backend health")?;

    println!("ok:            {}", health.ok);
    println!("title:         {}", health.title);
    println!("rows:          {}", health.rows_total);
    println!("pandemic rows: {}", health.pandemic_rows);
    println!(
        "default model: {}",
        health.default_model.as_deref().unwrap_or("-")
    );
    Ok(())
}

async fn run_debate(
    config: &ArenaConfig,
    row_id: Option<i64>,
    model: Option<String>,
    temperature: f64,
    rebuttals: u32,
    max_tokens: Option<u32>,
    claim_override: Option<String>,
) -> Result<()> {
    let http = reqwest::Client::new();

    // Health is a hint only; a dead endpoint still fails cleanly below.
    let default_model = match catalog::fetch_health(&http, &config.base_url).await {
        Ok(health) => health.default_model,
        Err(err) => {
            info!(%err, "health check failed; using configured model");
            None
        }
    };
    let model = model
        .or(default_model)
        .unwrap_or_else(|| config.model.clone());

    let row_id = match row_id {
        Some(id) => id,
        None => {
            let catalog = catalog::fetch_cases(&http, &config.base_url)
                .await
                .context("fetching case catalog")?;
            match catalog.preferred() {
                Some(case) => {
                    println!("case row {}: {}", case.row_id, catalog::snippet(&case.claim, SNIPPET_WIDTH));
                    case.row_id
                }
                None => bail!("backend has no cases; supply --row-id"),
            }
        }
    };

    let command = StartCommand {
        row_id,
        model,
        temperature,
        rebuttal_rounds: rebuttals,
        max_tokens,
        claim_override,
    };

    let connector = WsConnector::for_backend(&config.base_url)?;
    info!(url = connector.url(), row_id, "starting debate");

    let (mut client, mut deltas) = DebateClient::new(connector);
    client.start(command)?;

    let mut stdout = std::io::stdout();
    'stream: while let Some(delta) = deltas.recv().await {
        for change in delta {
            match change {
                StateChange::PhaseChanged { name } => {
                    println!("\n── {name} ──");
                }
                StateChange::TurnStarted { agent, .. } => {
                    println!("\n[{agent}]");
                }
                StateChange::DeltaApplied { delta, .. } => {
                    print!("{delta}");
                    let _ = stdout.flush();
                }
                StateChange::TurnCompleted { .. } => {
                    println!();
                }
                StateChange::SessionError { message } => {
                    eprintln!("\nbackend error: {message}");
                }
                StateChange::ConnectionChanged {
                    status: ConnectionStatus::Closed,
                } => {
                    break 'stream;
                }
                _ => {}
            }
        }
    }

    client.stop();

    let session = client.snapshot();
    match &session.verdict {
        Some(verdict) => {
            println!("\n{}", "=".repeat(72));
            println!(
                "Verdict: {} | Confidence: {:.0}%",
                verdict.verdict,
                verdict.confidence * 100.0
            );
            if !verdict.one_sentence_summary.is_empty() {
                println!("{}", verdict.one_sentence_summary);
            }
            for bullet in verdict.display_rationale() {
                println!("  • {bullet}");
            }
        }
        None => println!("\n(no verdict)"),
    }

    if !session.finished {
        eprintln!("connection closed before the debate finished");
    }
    Ok(())
}
