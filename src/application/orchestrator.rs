use crate::application::ledger::PayoutLedger;
use crate::domain::order::Order;
use crate::domain::rates::CommissionRateResolver;
use crate::domain::split::{self, SplitResult};
use crate::error::Result;
use tracing::debug;

/// Reacts to an "order paid" notification: computes the per-seller split and
/// drives the ledger to record one HOLD payout per `(order, seller)` pair.
pub struct PaymentOrchestrator {
    resolver: CommissionRateResolver,
    ledger: PayoutLedger,
}

impl PaymentOrchestrator {
    pub fn new(resolver: CommissionRateResolver, ledger: PayoutLedger) -> Self {
        Self { resolver, ledger }
    }

    pub fn ledger(&self) -> &PayoutLedger {
        &self.ledger
    }

    /// Splits the order and records payouts. Returns `None` when the order
    /// has no seller-owned lines; the ledger is not touched in that case.
    ///
    /// The computed split is validated before any payout is written; an
    /// integrity failure propagates and nothing is recorded.
    pub async fn process_payment(&self, order: &Order) -> Result<Option<SplitResult>> {
        let result = split::split_order(order, &self.resolver)?;
        if result.sellers.is_empty() {
            return Ok(None);
        }
        split::validate(&result)?;

        for seller in &result.sellers {
            // Zero-amount payouts are never recorded (rate 1 keeps the whole
            // line total as commission); the split itself still appears in
            // the returned result for the audit trail.
            if seller.amount == 0 {
                debug!(seller = %seller.seller_id, order = %order.id, "skipping zero-amount payout");
                continue;
            }
            self.ledger
                .create(
                    seller.seller_id.clone(),
                    order.id.clone(),
                    seller.amount,
                    seller.commission,
                )
                .await?;
        }

        Ok(Some(result))
    }

    /// Idempotent, re-entrant entry point for order-paid notifications.
    ///
    /// The existence pre-check is a performance short-circuit only — two
    /// concurrent calls can both pass it before either has written anything.
    /// Correctness comes entirely from the ledger's per-key creation
    /// guarantee; a duplicate detected there resolves to the existing record
    /// rather than an error.
    pub async fn process_payment_idempotent(&self, order: &Order) -> Result<Option<SplitResult>> {
        if self.ledger.has_payouts_for_order(&order.id).await? {
            debug!(order = %order.id, "order already has payouts, skipping");
            return Ok(None);
        }
        self.process_payment(order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Rate;
    use crate::domain::order::{OrderId, OrderLine, SellerId};
    use crate::domain::payout::PayoutStatus;
    use crate::domain::rates::InMemorySellerDirectory;
    use crate::infrastructure::in_memory::InMemoryPayoutStore;
    use std::sync::Arc;

    fn orchestrator(default_rate: &str, overrides: &[(&str, &str)]) -> PaymentOrchestrator {
        let mut directory = InMemorySellerDirectory::new();
        for (seller, rate) in overrides {
            directory.set_rate(SellerId::from(*seller), rate.parse().unwrap());
        }
        let resolver = CommissionRateResolver::new(
            Arc::new(directory),
            default_rate.parse::<Rate>().unwrap(),
        );
        let ledger = PayoutLedger::new(Arc::new(InMemoryPayoutStore::new()));
        PaymentOrchestrator::new(resolver, ledger)
    }

    fn order(id: &str, lines: &[(i64, Option<&str>)]) -> Order {
        Order {
            id: OrderId::from(id),
            total: lines.iter().map(|(price, _)| price).sum(),
            lines: lines
                .iter()
                .enumerate()
                .map(|(i, (price, seller))| OrderLine {
                    id: format!("l-{i}"),
                    price: *price,
                    seller: seller.map(SellerId::from),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_process_payment_creates_hold_payouts() {
        let orchestrator = orchestrator("0.15", &[]);
        let order = order("o-1", &[(10000, Some("s-1"))]);

        let result = orchestrator.process_payment(&order).await.unwrap().unwrap();
        assert_eq!(result.commission, 1500);
        assert_eq!(result.payout, 8500);

        let payouts = orchestrator
            .ledger()
            .payouts_for_seller(&SellerId::from("s-1"))
            .await
            .unwrap();
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].status, PayoutStatus::Hold);
        assert_eq!(payouts[0].amount.value(), 8500);
        assert_eq!(payouts[0].commission, 1500);
    }

    #[tokio::test]
    async fn test_order_without_seller_lines_returns_none() {
        let orchestrator = orchestrator("0.15", &[]);
        let order = order("o-1", &[(5000, None)]);

        let result = orchestrator.process_payment(&order).await.unwrap();
        assert!(result.is_none());
        assert!(
            !orchestrator
                .ledger()
                .has_payouts_for_order(&OrderId::from("o-1"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_idempotent_entry_point_short_circuits() {
        let orchestrator = orchestrator("0.15", &[]);
        let order = order("o-1", &[(10000, Some("s-1"))]);

        let first = orchestrator.process_payment_idempotent(&order).await.unwrap();
        assert!(first.is_some());

        let second = orchestrator.process_payment_idempotent(&order).await.unwrap();
        assert!(second.is_none());

        let payouts = orchestrator
            .ledger()
            .payouts_for_seller(&SellerId::from("s-1"))
            .await
            .unwrap();
        assert_eq!(payouts.len(), 1);
    }

    #[tokio::test]
    async fn test_full_commission_rate_creates_no_payout_row() {
        let orchestrator = orchestrator("0.15", &[("s-1", "1.0")]);
        let order = order("o-1", &[(10000, Some("s-1"))]);

        let result = orchestrator.process_payment(&order).await.unwrap().unwrap();
        assert_eq!(result.commission, 10000);
        assert_eq!(result.payout, 0);

        // A zero-amount payout is never persisted.
        let payouts = orchestrator
            .ledger()
            .payouts_for_seller(&SellerId::from("s-1"))
            .await
            .unwrap();
        assert!(payouts.is_empty());
    }
}
