//! DocuBuddy command-line front end
//!
//! Run with: cargo run -p docubuddy-rag --features cli --bin docubuddy -- --help

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docubuddy_rag::providers::{OllamaClient, OllamaEmbedder, OllamaLlm};
use docubuddy_rag::storage::format_size;
use docubuddy_rag::{QueryResponse, RagConfig, RagSession};

/// Log filter when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "docubuddy=info,docubuddy_rag=info,docubuddy_core=info";

#[derive(Parser, Debug)]
#[command(name = "docubuddy", version, about = "Ask questions about your documents")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add documents to a knowledge base, creating it if needed
    Ingest {
        /// Files to ingest (txt, md, csv, pdf, docx)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Knowledge base name
        #[arg(long)]
        kb: String,
    },
    /// Ask a single question
    Query {
        question: String,
        #[arg(long)]
        kb: String,
        /// Generation model override
        #[arg(long)]
        model: Option<String>,
        /// Temperature override
        #[arg(long)]
        temperature: Option<f32>,
    },
    /// Interactive multi-turn conversation
    Chat {
        #[arg(long)]
        kb: String,
    },
    /// List stored knowledge bases
    List,
    /// Delete a stored knowledge base
    Delete { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RagConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RagConfig::default(),
    };

    let session = build_session(config)?;

    match cli.command {
        Command::Ingest { files, kb } => ingest(&session, &files, &kb).await,
        Command::Query {
            question,
            kb,
            model,
            temperature,
        } => {
            session.load_named(&kb).await?;
            if let Some(model) = model {
                session.update_model(&model)?;
            }
            if let Some(temperature) = temperature {
                session.update_temperature(temperature)?;
            }
            let response = ask(&session, &question).await?;
            print_response(&response, true);
            Ok(())
        }
        Command::Chat { kb } => chat(&session, &kb).await,
        Command::List => list(&session),
        Command::Delete { name } => {
            session.delete_knowledge_base(&name)?;
            println!("{} deleted {}", style("✓").green(), name);
            Ok(())
        }
    }
}

fn build_session(config: RagConfig) -> Result<RagSession> {
    let client = Arc::new(OllamaClient::new(&config.llm)?);
    let embedder = Arc::new(OllamaEmbedder::from_client(
        Arc::clone(&client),
        &config.embeddings,
    ));
    let llm = Arc::new(OllamaLlm::from_client(client));
    Ok(RagSession::new(config, embedder, llm)?)
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

async fn ingest(session: &RagSession, files: &[PathBuf], kb: &str) -> Result<()> {
    let bar = spinner(&format!("Processing {} file(s)", files.len()))?;
    let result = session.ingest(files, Some(kb)).await;
    bar.finish_and_clear();
    let report = result?;

    println!(
        "{} {} passage(s) from {} file(s) added to '{}' ({} total)",
        style("✓").green(),
        report.passages_added,
        report.files_processed,
        kb,
        session.passage_count().await
    );
    for failure in &report.failures {
        println!(
            "{} {}: {}",
            style("✗").red(),
            failure.path.display(),
            failure.error
        );
    }
    Ok(())
}

async fn ask(session: &RagSession, question: &str) -> Result<QueryResponse> {
    let bar = spinner("Thinking")?;
    let result = session.query(question).await;
    bar.finish_and_clear();
    Ok(result?)
}

fn print_response(response: &QueryResponse, show_sources: bool) {
    println!("{}", response.answer.trim());
    if !response.context_found {
        println!("{}", style("(no relevant passages found)").dim());
    } else if show_sources {
        print_sources(response);
    }
}

fn print_sources(response: &QueryResponse) {
    println!("\n{}", style("Sources:").bold());
    for (i, source) in response.sources.iter().enumerate() {
        let name = source.get("source").map(String::as_str).unwrap_or("unknown");
        let location = match (source.get("page"), source.get("row")) {
            (Some(page), _) => format!(", page {}", page),
            (None, Some(row)) => format!(", row {}", row),
            _ => String::new(),
        };
        println!("  [{}] {}{}", i + 1, name, location);
    }
}

async fn chat(session: &RagSession, kb: &str) -> Result<()> {
    session.load_named(kb).await?;
    println!(
        "{} '{}' loaded with {} passage(s). Commands: /clear /model <name> /temperature <value> /sources /quit",
        style("DocuBuddy").cyan().bold(),
        kb,
        session.passage_count().await
    );

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last: Option<QueryResponse> = None;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let (name, arg) = command
                .split_once(' ')
                .map(|(n, a)| (n, a.trim()))
                .unwrap_or((command, ""));
            let outcome = match name {
                "quit" | "exit" => break,
                "clear" => {
                    session.clear_memory();
                    Ok("conversation cleared".to_string())
                }
                "model" => session
                    .update_model(arg)
                    .map(|_| format!("model set to {}", arg)),
                "temperature" => match arg.parse::<f32>() {
                    Ok(value) => session
                        .update_temperature(value)
                        .map(|_| format!("temperature set to {}", value)),
                    Err(_) => {
                        println!("{} expected a number", style("✗").red());
                        continue;
                    }
                },
                "sources" => {
                    match &last {
                        Some(response) if response.context_found => print_sources(response),
                        _ => println!("no sources for the last answer"),
                    }
                    continue;
                }
                other => {
                    println!("{} unknown command /{}", style("✗").red(), other);
                    continue;
                }
            };
            match outcome {
                Ok(message) => println!("{} {}", style("✓").green(), message),
                Err(e) => println!("{} {}", style("✗").red(), e),
            }
            continue;
        }

        match ask(session, line).await {
            Ok(response) => {
                print_response(&response, false);
                last = Some(response);
            }
            Err(e) => println!("{} {}", style("✗").red(), e),
        }
    }

    Ok(())
}

fn list(session: &RagSession) -> Result<()> {
    let infos = session.list_knowledge_bases()?;
    if infos.is_empty() {
        println!(
            "No knowledge bases under {}",
            session.catalog().root().display()
        );
        return Ok(());
    }

    for info in infos {
        let modified = info
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let passages = info
            .passages
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{:<24} {:>10} {:>8} passages  {}",
            style(&info.name).bold(),
            format_size(info.size_bytes),
            passages,
            modified
        );
    }
    Ok(())
}
