use crate::domain::money::Amount;
use crate::domain::order::{OrderId, SellerId};
use crate::error::PayoutError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned payout identifier, monotonically increasing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PayoutId(pub u64);

impl std::fmt::Display for PayoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a payout record.
///
/// `Processing` is reserved for the external payout-execution worker; nothing
/// in this crate transitions a record into it, but admin operations accept it
/// as an eligible source state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Escrow. Initial state; funds recognized but not releasable.
    Hold,
    /// Released, awaiting external payout execution.
    Pending,
    /// Payout execution in flight (written by an external worker only).
    Processing,
    /// Terminal success.
    Completed,
    /// Terminal failure, with a recorded reason.
    Failed,
}

impl PayoutStatus {
    /// True for the states an admin approve/reject may act on.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Hold => "hold",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Creation request for a payout record, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayout {
    pub seller_id: SellerId,
    pub order_id: OrderId,
    pub amount: Amount,
    pub commission: i64,
}

/// A seller's entitlement from one order. The permanent audit record:
/// created once per `(order_id, seller_id)`, mutated only through status
/// transitions, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub seller_id: SellerId,
    pub order_id: OrderId,
    pub amount: Amount,
    pub commission: i64,
    pub status: PayoutStatus,
    pub released_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payout {
    pub fn new(id: PayoutId, new: NewPayout, now: DateTime<Utc>) -> Self {
        Self {
            id,
            seller_id: new.seller_id,
            order_id: new.order_id,
            amount: new.amount,
            commission: new.commission,
            status: PayoutStatus::Hold,
            released_at: None,
            completed_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// HOLD -> PENDING, stamping `released_at`. There is no path back to HOLD.
    pub fn release(&mut self, now: DateTime<Utc>) -> Result<(), PayoutError> {
        if self.status != PayoutStatus::Hold {
            return Err(PayoutError::StateConflict(format!(
                "Only HOLD payouts can be released, payout {} is {}",
                self.id, self.status
            )));
        }
        self.status = PayoutStatus::Pending;
        self.released_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// PENDING|PROCESSING -> COMPLETED, stamping `completed_at`.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), PayoutError> {
        if !self.status.is_reviewable() {
            return Err(PayoutError::StateConflict(format!(
                "Only PENDING or PROCESSING payouts can be approved, payout {} is {}",
                self.id, self.status
            )));
        }
        self.status = PayoutStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// PENDING|PROCESSING -> FAILED, recording the reason.
    pub fn fail(&mut self, reason: String, now: DateTime<Utc>) -> Result<(), PayoutError> {
        if reason.trim().is_empty() {
            return Err(PayoutError::Validation(
                "Rejection reason must not be empty".to_string(),
            ));
        }
        if !self.status.is_reviewable() {
            return Err(PayoutError::StateConflict(format!(
                "Only PENDING or PROCESSING payouts can be rejected, payout {} is {}",
                self.id, self.status
            )));
        }
        self.status = PayoutStatus::Failed;
        self.failure_reason = Some(reason);
        self.updated_at = now;
        Ok(())
    }
}
