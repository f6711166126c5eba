use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_indexer::{
    api, config, logging,
    pipeline::{IngestionOrchestrator, IngestionReport, IngestionRequest},
};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "pdf-indexer",
    version,
    about = "Ingest uploaded PDFs into a vector index"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for upload events over HTTP.
    Serve {
        /// Port to bind; defaults to SERVER_PORT or the first free port in 4100-4199.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Ingest a single file.
    Ingest {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        document_id: String,
    },
    /// Ingest the upload event stored in PATH, or read from stdin.
    Event { path: Option<PathBuf> },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "pdf-indexer exited with an error");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = config::init_config().context("failed to load configuration")?;
    let orchestrator = Arc::new(
        IngestionOrchestrator::from_config(config).context("failed to build ingestion pipeline")?,
    );

    match cli.command {
        Command::Serve { port } => {
            let app = api::create_router(orchestrator);
            let (listener, port) = bind_listener(port.or(config.server_port))
                .await
                .context("failed to bind listener")?;
            tracing::info!("Listening on http://0.0.0.0:{}", port);
            axum::serve(listener, app).await.context("server error")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ingest { file, document_id } => {
            let request = IngestionRequest::new(file.to_string_lossy(), document_id);
            Ok(finish(orchestrator.run(request).await))
        }
        Command::Event { path } => {
            let raw = match path {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read event from {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut buffer)
                        .await
                        .context("failed to read event from stdin")?;
                    buffer
                }
            };
            let event: Value = serde_json::from_str(&raw).context("event is not valid JSON")?;
            Ok(finish(orchestrator.run_event(&event).await))
        }
    }
}

fn finish(report: IngestionReport) -> ExitCode {
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::warn!(error = %err, "Failed to render ingestion report"),
    }
    if report.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn bind_listener(port: Option<u16>) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4100..=4199;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4100-4199",
    ))
}
