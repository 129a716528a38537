//! Blobfeed Ingest - container-to-event pump daemon

use anyhow::Result;
use blobfeed_common::logging::{init_logging, LogConfig, LogLevel};
use blobfeed_ingest::{config::Config, pump::BlobPump, storage::S3Container, Event};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "blobfeed-ingest")]
#[command(author, version, about = "Pump blobs from a storage container into an event stream")]
struct Cli {
    /// Container to poll (overrides BLOBFEED_CONTAINER)
    #[arg(short, long)]
    container: Option<String>,

    /// Poll interval in seconds (overrides BLOBFEED_INTERVAL)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Number of ingestion workers (overrides BLOBFEED_WORKERS)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence, field by field; the verbose
    // flag and the baked-in directives hold wherever the env is silent.
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("blobfeed-ingest".to_string())
        .filter_directives("aws_sdk_s3=warn,aws_smithy_runtime=warn,hyper=warn".to_string())
        .build()
        .overlay_env()?;

    init_logging(&log_config)?;

    info!("Starting Blobfeed ingest daemon");

    let mut config = Config::load()?;
    if let Some(container) = cli.container {
        config.storage.container = container;
    }
    if let Some(interval) = cli.interval {
        config.ingest.interval_secs = interval;
    }
    if let Some(workers) = cli.workers {
        config.ingest.workers = workers;
    }
    config.validate()?;

    info!(
        "Polling container '{}' every {}s with {} workers",
        config.storage.container, config.ingest.interval_secs, config.ingest.workers
    );

    let store = Arc::new(S3Container::new(&config.storage).await?);

    let (sink, events) = mpsc::unbounded_channel();
    let consumer = tokio::spawn(emit_events(events));

    let container = config.storage.container.clone();
    let handle = BlobPump::new(container, store, config.ingest).start(sink);

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, draining in-flight work");

    // Stop blocks until the pool has drained; dropping the pump's sink
    // then closes the channel and ends the consumer.
    handle.stop().await;

    if let Err(err) = consumer.await {
        error!(?err, "Event consumer task failed");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Default downstream consumer: one JSON line per event on stdout.
async fn emit_events(mut events: mpsc::UnboundedReceiver<Event>) {
    while let Some(event) = events.recv().await {
        match serde_json::to_string(&event) {
            // stdout is the event transport here, not a log target
            Ok(line) => println!("{}", line),
            Err(err) => error!(?err, "Failed to serialize event"),
        }
    }
}
