use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paymentsvc::application::cache::{CachedPaymentService, PaymentCache};
use paymentsvc::application::lifecycle::PaymentService;
use paymentsvc::application::sweeper::CleanupSweeper;
use paymentsvc::config::ServiceConfig;
use paymentsvc::domain::ports::PaymentStoreRef;
use paymentsvc::infrastructure::in_memory::InMemoryPaymentStore;
#[cfg(feature = "storage-rocksdb")]
use paymentsvc::infrastructure::rocksdb::RocksDBStore;
use paymentsvc::interfaces::commands;
use paymentsvc::interfaces::csv::command_reader::CommandReader;
use paymentsvc::interfaces::csv::payment_writer::{OutputFormat, PaymentWriter};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = "PAYMENTSVC_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Log level.
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a CSV file of payment commands and print the resulting payments
    Apply {
        /// Input commands CSV file
        input: PathBuf,

        /// Output encoding
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
    /// Fail stale pending payments once and print how many were failed
    Sweep,
    /// Run the periodic cleanup sweeper until interrupted
    Sweeper,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path).into_diagnostic()?,
        None => ServiceConfig::default(),
    };
    if let Some(db_path) = cli.db_path {
        config.db_path = Some(db_path);
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    init_tracing(&config.log_level);

    let store = open_store(config.db_path.as_deref())?;
    let service = Arc::new(PaymentService::new(store));
    let cache = PaymentCache::with_capacity(config.cache.effective_capacity());

    match cli.command {
        Commands::Apply { input, format } => {
            let service = CachedPaymentService::new(service, cache);
            apply(&service, &input, format).await
        }
        Commands::Sweep => {
            let sweeper = CleanupSweeper::new(service, config.sweeper).with_cache(cache);
            let report = sweeper.sweep_now().await.into_diagnostic()?;
            println!("{}", report.expired);
            Ok(())
        }
        Commands::Sweeper => {
            let sweeper = Arc::new(CleanupSweeper::new(service, config.sweeper).with_cache(cache));
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let handle = sweeper.start(shutdown_rx);

            tokio::signal::ctrl_c().await.into_diagnostic()?;
            info!("Interrupt received, stopping cleanup sweeper");
            let _ = shutdown_tx.send(true);

            handle.await.into_diagnostic()?.into_diagnostic()
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the payment output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn open_store(db_path: Option<&Path>) -> Result<PaymentStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            info!(path = %path.display(), "Using RocksDB payment store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            warn!(
                path = %path.display(),
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryPaymentStore::new()))
        }
        None => Ok(Arc::new(InMemoryPaymentStore::new())),
    }
}

async fn apply(service: &CachedPaymentService, input: &Path, format: OutputFormat) -> Result<()> {
    let file = File::open(input).into_diagnostic()?;
    let reader = CommandReader::new(file);

    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock(), format);

    for command in reader.commands() {
        match command {
            Ok(command) => match commands::execute(service, command).await {
                Ok(payment) => writer.write_payment(&payment).into_diagnostic()?,
                Err(e) => warn!("Error processing command: {}", e),
            },
            Err(e) => warn!("Error reading command: {}", e),
        }
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}
