use crate::domain::money::Rate;
use crate::domain::order::SellerId;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only lookup of a seller's configured commission rate. Backed by the
/// external seller registry; absence of an override is a normal case.
pub trait SellerDirectory: Send + Sync {
    fn commission_rate(&self, seller_id: &SellerId) -> Option<Rate>;
}

/// Resolves the effective commission rate for a seller: the seller's own
/// override when configured, otherwise the injected platform default.
///
/// Resolution never fails.
pub struct CommissionRateResolver {
    directory: Arc<dyn SellerDirectory>,
    default_rate: Rate,
}

impl CommissionRateResolver {
    pub fn new(directory: Arc<dyn SellerDirectory>, default_rate: Rate) -> Self {
        Self {
            directory,
            default_rate,
        }
    }

    pub fn resolve(&self, seller_id: &SellerId) -> Rate {
        self.directory
            .commission_rate(seller_id)
            .unwrap_or(self.default_rate)
    }
}

/// Seller rate table held in memory. Used by the CLI (loaded from the
/// seller-rates CSV) and by tests.
#[derive(Default)]
pub struct InMemorySellerDirectory {
    rates: HashMap<SellerId, Rate>,
}

impl InMemorySellerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, seller_id: SellerId, rate: Rate) -> Self {
        self.rates.insert(seller_id, rate);
        self
    }

    pub fn set_rate(&mut self, seller_id: SellerId, rate: Rate) {
        self.rates.insert(seller_id, rate);
    }
}

impl SellerDirectory for InMemorySellerDirectory {
    fn commission_rate(&self, seller_id: &SellerId) -> Option<Rate> {
        self.rates.get(seller_id).copied()
    }
}
