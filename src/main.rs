use clap::Parser;
use miette::{IntoDiagnostic, Result};
use splitpay::application::ledger::PayoutLedger;
use splitpay::application::orchestrator::PaymentOrchestrator;
use splitpay::domain::money::Rate;
use splitpay::domain::order::SellerId;
use splitpay::domain::ports::PayoutStore;
use splitpay::domain::rates::{CommissionRateResolver, InMemorySellerDirectory, SellerDirectory};
use splitpay::infrastructure::in_memory::InMemoryPayoutStore;
use splitpay::interfaces::csv::order_reader::{OrderReader, group_rows};
use splitpay::interfaces::csv::payout_writer::PayoutWriter;
use splitpay::interfaces::csv::rate_reader::read_seller_rates;
use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Replays paid-order notifications from a CSV file through the split-payment
/// core and dumps the resulting payout ledger to stdout.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CSV of paid order lines: order, line, price, seller
    input: PathBuf,

    /// Optional CSV of per-seller commission rates: seller, rate
    #[arg(long)]
    seller_rates: Option<PathBuf>,

    /// Platform default commission rate, applied without a seller override
    #[arg(long, default_value = "0.15")]
    default_rate: Rate,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Attempt a payout release for every seller after ingestion, with this
    /// minimum threshold in smallest currency units
    #[arg(long)]
    min_payout: Option<i64>,
}

#[cfg(feature = "storage-rocksdb")]
fn open_persistent_store(path: PathBuf) -> Result<Arc<dyn PayoutStore>> {
    use splitpay::infrastructure::rocksdb::RocksDbPayoutStore;
    Ok(Arc::new(
        RocksDbPayoutStore::open(path).into_diagnostic()?,
    ))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_persistent_store(_path: PathBuf) -> Result<Arc<dyn PayoutStore>> {
    Err(miette::miette!(
        "--db-path requires the storage-rocksdb feature"
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store: Arc<dyn PayoutStore> = match cli.db_path {
        Some(path) => open_persistent_store(path)?,
        None => Arc::new(InMemoryPayoutStore::new()),
    };

    let directory: Arc<dyn SellerDirectory> = match cli.seller_rates {
        Some(path) => {
            let file = File::open(path).into_diagnostic()?;
            Arc::new(read_seller_rates(file).into_diagnostic()?)
        }
        None => Arc::new(InMemorySellerDirectory::new()),
    };

    let resolver = CommissionRateResolver::new(directory, cli.default_rate);
    let ledger = PayoutLedger::new(store);
    let orchestrator = PaymentOrchestrator::new(resolver, ledger);

    // Ingest order-paid notifications, skipping unreadable rows.
    let file = File::open(cli.input).into_diagnostic()?;
    let mut rows = Vec::new();
    for row in OrderReader::new(file).rows() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => eprintln!("Error reading order line: {e}"),
        }
    }

    for order in group_rows(rows) {
        if let Err(e) = orchestrator.process_payment_idempotent(&order).await {
            eprintln!("Error processing order {}: {e}", order.id);
        }
    }

    // Sellers come from the store, not from this run's results: against a
    // persistent database a replayed order short-circuits to no result, but
    // its payouts still belong in the release pass and the dump.
    if let Some(minimum) = cli.min_payout {
        let sellers: BTreeSet<SellerId> = orchestrator
            .ledger()
            .all_payouts()
            .await
            .into_diagnostic()?
            .into_iter()
            .map(|p| p.seller_id)
            .collect();
        for seller in &sellers {
            match orchestrator.ledger().request_release(seller, minimum).await {
                Ok(released) => {
                    eprintln!("Released {} payouts for seller {seller}", released.len())
                }
                Err(e) => eprintln!("Release skipped for seller {seller}: {e}"),
            }
        }
    }

    // Dump the full ledger, newest first.
    let payouts = orchestrator.ledger().all_payouts().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = PayoutWriter::new(stdout.lock());
    writer.write_payouts(&payouts).into_diagnostic()?;

    Ok(())
}
