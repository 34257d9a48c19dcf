use crate::domain::order::{OrderId, SellerId};
use crate::domain::payout::{NewPayout, Payout, PayoutId, PayoutStatus};
use crate::domain::ports::{InsertOutcome, PayoutStore, ReleaseOutcome, UpdateOutcome};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    next_id: u64,
    payouts: HashMap<PayoutId, Payout>,
    /// Unique index on the (order_id, seller_id) natural key.
    by_key: HashMap<(OrderId, SellerId), PayoutId>,
}

/// Thread-safe in-memory payout store.
///
/// Every mutating operation holds the write lock for its whole critical
/// section, which is what makes `insert` atomic with respect to the unique
/// key check and `release_held` atomic with respect to the threshold check.
/// `Clone` shares the underlying state.
#[derive(Default, Clone)]
pub struct InMemoryPayoutStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryPayoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayoutStore for InMemoryPayoutStore {
    async fn insert(&self, new: NewPayout) -> Result<InsertOutcome> {
        let mut inner = self.inner.write().await;
        let key = (new.order_id.clone(), new.seller_id.clone());
        if inner.by_key.contains_key(&key) {
            return Ok(InsertOutcome::Duplicate);
        }

        inner.next_id += 1;
        let id = PayoutId(inner.next_id);
        let payout = Payout::new(id, new, Utc::now());
        inner.by_key.insert(key, id);
        inner.payouts.insert(id, payout.clone());
        Ok(InsertOutcome::Created(payout))
    }

    async fn get(&self, id: PayoutId) -> Result<Option<Payout>> {
        let inner = self.inner.read().await;
        Ok(inner.payouts.get(&id).cloned())
    }

    async fn find_by_key(
        &self,
        order_id: &OrderId,
        seller_id: &SellerId,
    ) -> Result<Option<Payout>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_key
            .get(&(order_id.clone(), seller_id.clone()))
            .and_then(|id| inner.payouts.get(id))
            .cloned())
    }

    async fn list_for_seller(&self, seller_id: &SellerId) -> Result<Vec<Payout>> {
        let inner = self.inner.read().await;
        let mut payouts: Vec<Payout> = inner
            .payouts
            .values()
            .filter(|p| &p.seller_id == seller_id)
            .cloned()
            .collect();
        // Ids are assigned monotonically, so newest first is descending id.
        payouts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(payouts)
    }

    async fn list_all(&self) -> Result<Vec<Payout>> {
        let inner = self.inner.read().await;
        let mut payouts: Vec<Payout> = inner.payouts.values().cloned().collect();
        payouts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(payouts)
    }

    async fn exists_for_order(&self, order_id: &OrderId) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.by_key.keys().any(|(order, _)| order == order_id))
    }

    async fn pending_total(&self, seller_id: &SellerId) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .payouts
            .values()
            .filter(|p| {
                &p.seller_id == seller_id
                    && matches!(p.status, PayoutStatus::Hold | PayoutStatus::Pending)
            })
            .map(|p| p.amount.value())
            .sum())
    }

    async fn list_in_review(&self) -> Result<Vec<Payout>> {
        let inner = self.inner.read().await;
        let mut payouts: Vec<Payout> = inner
            .payouts
            .values()
            .filter(|p| p.status.is_reviewable())
            .cloned()
            .collect();
        payouts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(payouts)
    }

    async fn release_held(
        &self,
        seller_id: &SellerId,
        minimum: i64,
        now: DateTime<Utc>,
    ) -> Result<ReleaseOutcome> {
        let mut inner = self.inner.write().await;

        let held_ids: Vec<PayoutId> = inner
            .payouts
            .values()
            .filter(|p| &p.seller_id == seller_id && p.status == PayoutStatus::Hold)
            .map(|p| p.id)
            .collect();
        if held_ids.is_empty() {
            return Ok(ReleaseOutcome::NothingHeld);
        }

        let held_total: i64 = held_ids
            .iter()
            .map(|id| inner.payouts[id].amount.value())
            .sum();
        if held_total < minimum {
            return Ok(ReleaseOutcome::BelowThreshold { held_total });
        }

        let mut released = Vec::with_capacity(held_ids.len());
        for id in held_ids {
            if let Some(payout) = inner.payouts.get_mut(&id) {
                payout.release(now)?;
                released.push(payout.clone());
            }
        }
        released.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(ReleaseOutcome::Released(released))
    }

    async fn update(&self, payout: Payout, expected: PayoutStatus) -> Result<UpdateOutcome> {
        let mut inner = self.inner.write().await;
        match inner.payouts.get_mut(&payout.id) {
            None => Ok(UpdateOutcome::Missing),
            Some(current) if current.status != expected => {
                Ok(UpdateOutcome::StatusChanged(current.clone()))
            }
            Some(current) => {
                *current = payout.clone();
                Ok(UpdateOutcome::Updated(payout))
            }
        }
    }
}
