use crate::domain::money::Amount;
use crate::domain::order::{OrderId, SellerId};
use crate::domain::payout::{NewPayout, Payout, PayoutId};
use crate::domain::ports::{InsertOutcome, PayoutStore, ReleaseOutcome, UpdateOutcome};
use crate::error::{PayoutError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded attempts to re-read the winning row after losing a creation race.
const DUPLICATE_LOOKUP_ATTEMPTS: u32 = 5;
/// First backoff delay; doubles on every subsequent attempt.
const DUPLICATE_LOOKUP_BACKOFF: Duration = Duration::from_millis(10);

/// The payout ledger: owns idempotent creation and every status transition
/// of payout records.
///
/// Creation correctness under concurrent duplicate notifications rests on the
/// store's `(order_id, seller_id)` uniqueness constraint, not on any
/// in-process lock; a losing writer re-reads the winner with bounded backoff
/// to tolerate read-after-write visibility lag.
#[derive(Clone)]
pub struct PayoutLedger {
    store: Arc<dyn PayoutStore>,
}

impl PayoutLedger {
    pub fn new(store: Arc<dyn PayoutStore>) -> Self {
        Self { store }
    }

    /// Records a seller's entitlement from an order, in HOLD.
    ///
    /// Idempotent per `(order_id, seller_id)`: when a record for the key
    /// already exists — from an earlier call or a concurrent one — every
    /// caller gets that same record back. A duplicate that cannot be re-read
    /// after the retry budget is a store consistency anomaly and surfaces as
    /// `Internal`.
    pub async fn create(
        &self,
        seller_id: SellerId,
        order_id: OrderId,
        amount: i64,
        commission: i64,
    ) -> Result<Payout> {
        let amount = Amount::new(amount)?;
        if commission < 0 {
            return Err(PayoutError::Validation(format!(
                "Commission must not be negative, got {commission}"
            )));
        }

        let new = NewPayout {
            seller_id: seller_id.clone(),
            order_id: order_id.clone(),
            amount,
            commission,
        };
        match self.store.insert(new).await? {
            InsertOutcome::Created(payout) => Ok(payout),
            InsertOutcome::Duplicate => self.find_winning_record(&order_id, &seller_id).await,
        }
    }

    /// Re-reads the record that won a creation race, with exponential
    /// backoff against read-after-write visibility lag.
    async fn find_winning_record(
        &self,
        order_id: &OrderId,
        seller_id: &SellerId,
    ) -> Result<Payout> {
        let mut backoff = DUPLICATE_LOOKUP_BACKOFF;
        for attempt in 1..=DUPLICATE_LOOKUP_ATTEMPTS {
            if let Some(payout) = self.store.find_by_key(order_id, seller_id).await? {
                debug!(
                    %order_id,
                    %seller_id,
                    attempt,
                    "duplicate payout creation resolved to existing record"
                );
                return Ok(payout);
            }
            if attempt < DUPLICATE_LOOKUP_ATTEMPTS {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
        warn!(%order_id, %seller_id, "duplicate payout reported but winning record never became visible");
        Err(PayoutError::Internal(format!(
            "Payout for order {order_id} / seller {seller_id} reported as duplicate but could not be found"
        )))
    }

    /// Releases all of a seller's HOLD payouts to PENDING, provided their
    /// combined amount meets `minimum_threshold`. Threshold check and bulk
    /// transition execute as one atomic unit inside the store.
    pub async fn request_release(
        &self,
        seller_id: &SellerId,
        minimum_threshold: i64,
    ) -> Result<Vec<Payout>> {
        match self
            .store
            .release_held(seller_id, minimum_threshold, Utc::now())
            .await?
        {
            ReleaseOutcome::Released(payouts) => Ok(payouts),
            ReleaseOutcome::BelowThreshold { held_total } => Err(PayoutError::ThresholdNotMet {
                held_total,
                minimum: minimum_threshold,
            }),
            ReleaseOutcome::NothingHeld => Err(PayoutError::NotFound(format!(
                "Seller {seller_id} has no payouts awaiting release"
            ))),
        }
    }

    /// Marks a PENDING or PROCESSING payout COMPLETED.
    pub async fn approve(&self, id: PayoutId) -> Result<Payout> {
        self.transition(id, |payout, now| payout.complete(now)).await
    }

    /// Marks a PENDING or PROCESSING payout FAILED with a reason.
    pub async fn reject(&self, id: PayoutId, reason: &str) -> Result<Payout> {
        if reason.trim().is_empty() {
            return Err(PayoutError::Validation(
                "Rejection reason must not be empty".to_string(),
            ));
        }
        let reason = reason.to_string();
        self.transition(id, move |payout, now| payout.fail(reason.clone(), now))
            .await
    }

    /// Optimistic row-scoped transition: read, apply, compare-and-update.
    /// Retries when the row moved to another still-eligible state underneath
    /// us; status monotonicity bounds the loop.
    async fn transition<F>(&self, id: PayoutId, apply: F) -> Result<Payout>
    where
        F: Fn(&mut Payout, chrono::DateTime<Utc>) -> Result<()>,
    {
        loop {
            let Some(current) = self.store.get(id).await? else {
                return Err(PayoutError::NotFound(format!("Payout {id} does not exist")));
            };
            let expected = current.status;
            let mut updated = current;
            apply(&mut updated, Utc::now())?;

            match self.store.update(updated, expected).await? {
                UpdateOutcome::Updated(payout) => return Ok(payout),
                UpdateOutcome::StatusChanged(_) => continue,
                UpdateOutcome::Missing => {
                    return Err(PayoutError::NotFound(format!("Payout {id} does not exist")));
                }
            }
        }
    }

    pub async fn get(&self, id: PayoutId) -> Result<Option<Payout>> {
        self.store.get(id).await
    }

    /// All payouts for a seller, newest first.
    pub async fn payouts_for_seller(&self, seller_id: &SellerId) -> Result<Vec<Payout>> {
        self.store.list_for_seller(seller_id).await
    }

    /// Every payout in the ledger, newest first. Covers records created by
    /// earlier runs against the same store, not just this process.
    pub async fn all_payouts(&self) -> Result<Vec<Payout>> {
        self.store.list_all().await
    }

    /// Sum of the seller's HOLD and PENDING amounts.
    pub async fn pending_total(&self, seller_id: &SellerId) -> Result<i64> {
        self.store.pending_total(seller_id).await
    }

    /// True iff the seller's HOLD+PENDING total meets the threshold.
    /// Equality at the boundary qualifies.
    pub async fn can_request_payout(
        &self,
        seller_id: &SellerId,
        minimum_threshold: i64,
    ) -> Result<bool> {
        Ok(self.pending_total(seller_id).await? >= minimum_threshold)
    }

    /// The admin review queue: PENDING and PROCESSING payouts.
    pub async fn pending_payouts(&self) -> Result<Vec<Payout>> {
        self.store.list_in_review().await
    }

    pub async fn has_payouts_for_order(&self, order_id: &OrderId) -> Result<bool> {
        self.store.exists_for_order(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payout::PayoutStatus;
    use crate::infrastructure::in_memory::InMemoryPayoutStore;

    fn ledger() -> PayoutLedger {
        PayoutLedger::new(Arc::new(InMemoryPayoutStore::new()))
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_amount() {
        let ledger = ledger();
        let result = ledger
            .create(SellerId::from("s-1"), OrderId::from("o-1"), 0, 0)
            .await;
        assert!(matches!(result, Err(PayoutError::Validation(_))));

        let result = ledger
            .create(SellerId::from("s-1"), OrderId::from("o-1"), -50, 0)
            .await;
        assert!(matches!(result, Err(PayoutError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_commission() {
        let ledger = ledger();
        let result = ledger
            .create(SellerId::from("s-1"), OrderId::from("o-1"), 100, -1)
            .await;
        assert!(matches!(result, Err(PayoutError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_returns_existing_record_for_duplicate_key() {
        let ledger = ledger();
        let first = ledger
            .create(SellerId::from("s-1"), OrderId::from("o-1"), 8500, 1500)
            .await
            .unwrap();
        let second = ledger
            .create(SellerId::from("s-1"), OrderId::from("o-1"), 8500, 1500)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            ledger
                .payouts_for_seller(&SellerId::from("s-1"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_new_payouts_start_in_hold() {
        let ledger = ledger();
        let payout = ledger
            .create(SellerId::from("s-1"), OrderId::from("o-1"), 8500, 1500)
            .await
            .unwrap();
        assert_eq!(payout.status, PayoutStatus::Hold);
        assert!(payout.released_at.is_none());
    }
}
