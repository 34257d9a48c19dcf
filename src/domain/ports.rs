use crate::domain::order::{OrderId, SellerId};
use crate::domain::payout::{NewPayout, Payout, PayoutId, PayoutStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of an insert against the `(order_id, seller_id)` unique key.
///
/// The duplicate case is an explicit result, not an error: a creation race is
/// normal operation and is resolved by the ledger, never surfaced to callers.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(Payout),
    Duplicate,
}

/// Outcome of the atomic release of a seller's HOLD payouts.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    Released(Vec<Payout>),
    BelowThreshold { held_total: i64 },
    NothingHeld,
}

/// Outcome of an optimistic row update guarded by an expected status.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Payout),
    /// The row's status no longer matches what the caller read.
    StatusChanged(Payout),
    Missing,
}

/// Durable store for payout records.
///
/// Implementations must enforce uniqueness of `(order_id, seller_id)` at the
/// store level; all concurrency correctness of payout creation rests on that
/// constraint rather than on any in-process lock. `release_held` must run its
/// threshold check and bulk transition as a single atomic unit over one
/// snapshot of the seller's HOLD rows.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    async fn insert(&self, new: NewPayout) -> Result<InsertOutcome>;

    async fn get(&self, id: PayoutId) -> Result<Option<Payout>>;

    async fn find_by_key(&self, order_id: &OrderId, seller_id: &SellerId)
    -> Result<Option<Payout>>;

    /// All payouts for a seller, newest first.
    async fn list_for_seller(&self, seller_id: &SellerId) -> Result<Vec<Payout>>;

    /// Every payout in the ledger, newest first. Backs the full ledger dump.
    async fn list_all(&self) -> Result<Vec<Payout>>;

    async fn exists_for_order(&self, order_id: &OrderId) -> Result<bool>;

    /// Sum of HOLD and PENDING amounts for a seller.
    async fn pending_total(&self, seller_id: &SellerId) -> Result<i64>;

    /// PENDING and PROCESSING payouts, the admin review queue.
    async fn list_in_review(&self) -> Result<Vec<Payout>>;

    /// Atomically: sum the seller's HOLD amounts, compare against `minimum`,
    /// and on success transition every HOLD row to PENDING stamped with `now`.
    async fn release_held(
        &self,
        seller_id: &SellerId,
        minimum: i64,
        now: DateTime<Utc>,
    ) -> Result<ReleaseOutcome>;

    /// Replaces the stored row for `payout.id` only if its current status is
    /// `expected`.
    async fn update(&self, payout: Payout, expected: PayoutStatus) -> Result<UpdateOutcome>;
}
