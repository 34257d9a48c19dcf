//! CSV adapters for the CLI: order-line ingestion, seller rate tables, and
//! the ledger dump.

pub mod order_reader;
pub mod payout_writer;
pub mod rate_reader;
