//! Spacetime Indexer Main Entry Point
//!
//! Reads newline-delimited JSON messages from the file given as the first
//! argument, or from stdin, and applies them to the search engine.

use dotenv::dotenv;
use spacetime_indexer::consumer::{MessageReader, DEFAULT_READ_AHEAD};
use spacetime_indexer::{Dependencies, IndexingError};
use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("spacetime_indexer=info,spacetime_indexer_repository=info")
    });

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "spacetime-indexer",
        service_version = env!("CARGO_PKG_VERSION"),
        json = json,
        "Tracing initialized"
    );
}

/// Open the message input.
fn open_input() -> Result<Box<dyn BufRead + Send>, IndexingError> {
    match env::args().nth(1) {
        Some(path) => {
            let file = File::open(&path)
                .map_err(|e| IndexingError::config(format!("Cannot open '{}': {}", path, e)))?;
            info!(path = %path, "Reading messages from file");
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            info!("Reading messages from stdin");
            Ok(Box::new(BufReader::new(io::stdin())))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting Spacetime Indexer");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    // Blocking reads happen on the reader thread, so ctrl-c stays responsive.
    let messages = MessageReader::new(open_input()?).spawn(DEFAULT_READ_AHEAD)?;

    tokio::select! {
        result = deps.orchestrator.run_messages(messages) => match result {
            Ok(report) => {
                info!(
                    documents_written = report.documents_written,
                    records_rejected = report.records_rejected,
                    "Indexer completed successfully"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Indexer failed");
                Err(e.into())
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            Ok(())
        }
    }
}
