use crate::domain::money::Rate;
use crate::domain::order::{Order, SellerId};
use crate::domain::rates::CommissionRateResolver;
use crate::error::{PayoutError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The (commission, payout) pair computed from one line total and a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub commission: i64,
    pub payout: i64,
}

/// One seller's share of an order, with the rate that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerSplit {
    pub seller_id: SellerId,
    /// Amount payable to the seller.
    pub amount: i64,
    /// Commission withheld by the platform.
    pub commission: i64,
    /// Sum of this seller's line prices in the order.
    pub line_total: i64,
    /// The commission rate actually applied, recorded for the audit trail.
    pub rate: Rate,
}

/// Result of splitting one order across its sellers. Ephemeral; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    /// Sum of all seller-owned line prices.
    pub total: i64,
    /// Aggregate commission across sellers.
    pub commission: i64,
    /// Aggregate seller payout across sellers.
    pub payout: i64,
    /// Per-seller breakdowns, ordered by first appearance in the order.
    pub sellers: Vec<SellerSplit>,
}

impl SplitResult {
    pub fn empty() -> Self {
        Self {
            total: 0,
            commission: 0,
            payout: 0,
            sellers: Vec::new(),
        }
    }
}

/// Splits `amount` at `rate`. Commission is rounded to the nearest smallest
/// currency unit, half away from zero; the payout is the remainder, never
/// rounded independently. That is the rule that guarantees
/// `commission + payout == amount` exactly, even for non-terminating rate
/// fractions.
pub fn split(amount: i64, rate: Rate) -> Result<Split> {
    if amount < 0 {
        return Err(PayoutError::Validation(format!(
            "Cannot split a negative amount: {amount}"
        )));
    }
    let commission = (Decimal::from(amount) * rate.value())
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| {
            PayoutError::Integrity(format!(
                "Commission for amount {amount} at rate {rate} does not fit a currency amount"
            ))
        })?;
    Ok(Split {
        commission,
        payout: amount - commission,
    })
}

/// Splits an order across its sellers.
///
/// Lines without a seller reference are platform-owned and skipped. Each
/// seller's resolved rate applies only to that seller's own line total. An
/// order with no seller-owned lines yields the empty result; that is the
/// normal "no marketplace content" case, not an error.
pub fn split_order(order: &Order, resolver: &CommissionRateResolver) -> Result<SplitResult> {
    let mut seller_order: Vec<SellerId> = Vec::new();
    let mut line_totals: HashMap<SellerId, i64> = HashMap::new();

    for (seller_id, line) in order.seller_lines() {
        if !line_totals.contains_key(seller_id) {
            seller_order.push(seller_id.clone());
        }
        *line_totals.entry(seller_id.clone()).or_insert(0) += line.price;
    }

    let mut result = SplitResult::empty();
    for seller_id in seller_order {
        let line_total = line_totals[&seller_id];
        let rate = resolver.resolve(&seller_id);
        let Split { commission, payout } = split(line_total, rate)?;

        result.total += line_total;
        result.commission += commission;
        result.payout += payout;
        result.sellers.push(SellerSplit {
            seller_id,
            amount: payout,
            commission,
            line_total,
            rate,
        });
    }

    Ok(result)
}

/// Checks that a computed result reconciles. A failure here is a programming
/// or data bug and must never be clamped or swallowed downstream.
///
/// The aggregate tolerance is `sellers - 1` units: the aggregate is a sum of
/// independently rounded per-seller splits, while each individual split must
/// reconcile exactly.
pub fn validate(result: &SplitResult) -> Result<()> {
    for seller in &result.sellers {
        if seller.commission < 0 {
            return Err(PayoutError::Integrity(format!(
                "Negative commission {} for seller {}",
                seller.commission, seller.seller_id
            )));
        }
        if seller.amount < 0 {
            return Err(PayoutError::Integrity(format!(
                "Negative payout {} for seller {}",
                seller.amount, seller.seller_id
            )));
        }
        if seller.commission > seller.line_total {
            return Err(PayoutError::Integrity(format!(
                "Commission {} exceeds line total {} for seller {}",
                seller.commission, seller.line_total, seller.seller_id
            )));
        }
    }

    let tolerance = result.sellers.len().saturating_sub(1) as i64;
    let drift = (result.commission + result.payout - result.total).abs();
    if drift > tolerance {
        return Err(PayoutError::Integrity(format!(
            "Split does not reconcile: commission {} + payout {} differs from total {} by {}",
            result.commission, result.payout, result.total, drift
        )));
    }

    Ok(())
}
