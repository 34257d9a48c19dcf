#![allow(dead_code)]

use splitpay::application::ledger::PayoutLedger;
use splitpay::application::orchestrator::PaymentOrchestrator;
use splitpay::domain::money::Rate;
use splitpay::domain::order::{Order, OrderId, OrderLine, SellerId};
use splitpay::domain::ports::PayoutStore;
use splitpay::domain::rates::{CommissionRateResolver, InMemorySellerDirectory};
use splitpay::infrastructure::in_memory::InMemoryPayoutStore;
use std::sync::Arc;

/// Builds an order from `(price, seller)` pairs; `None` marks a
/// platform-owned line.
pub fn order(id: &str, lines: &[(i64, Option<&str>)]) -> Order {
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

pub fn in_memory_ledger() -> PayoutLedger {
    PayoutLedger::new(Arc::new(InMemoryPayoutStore::new()))
}

/// Orchestrator over a caller-supplied store, so tests can share one store
/// between several orchestrators to model independent workers.
pub fn orchestrator_over(
    store: Arc<dyn PayoutStore>,
    default_rate: &str,
    overrides: &[(&str, &str)],
) -> PaymentOrchestrator {
    let mut directory = InMemorySellerDirectory::new();
    for (seller, rate) in overrides {
        directory.set_rate(SellerId::from(*seller), rate.parse().unwrap());
    }
    let resolver =
        CommissionRateResolver::new(Arc::new(directory), default_rate.parse::<Rate>().unwrap());
    PaymentOrchestrator::new(resolver, PayoutLedger::new(store))
}
