use thiserror::Error;

/// Error taxonomy for the split-payment core.
///
/// Duplicate-creation races are resolved inside `PayoutLedger::create` and are
/// never surfaced through this enum; callers only see a duplicate that could
/// not be re-read as `Internal`, which signals a store consistency problem
/// rather than a normal race.
#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("State conflict: {0}")]
    StateConflict(String),
    #[error("Minimum payout threshold not met: held {held_total}, minimum {minimum}")]
    ThresholdNotMet { held_total: i64, minimum: i64 },
    #[error("Integrity error: {0}")]
    Integrity(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PayoutError>;
