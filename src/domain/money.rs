use crate::error::PayoutError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A strictly positive monetary amount in the smallest currency unit (cents).
///
/// A payout of zero is never recorded; `Amount` makes that rule part of the
/// type rather than a check scattered across callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, PayoutError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(PayoutError::Validation(
                "Payout amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A commission rate in `[0, 1]` inclusive.
///
/// Rate 0 means the seller keeps everything; rate 1 means the platform keeps
/// everything. Both are valid configurations, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    pub fn new(value: Decimal) -> Result<Self, PayoutError> {
        if value >= Decimal::ZERO && value <= Decimal::ONE {
            Ok(Self(value))
        } else {
            Err(PayoutError::Validation(format!(
                "Commission rate must be within [0, 1], got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Rate {
    type Err = PayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Decimal = s
            .parse()
            .map_err(|_| PayoutError::Validation(format!("Invalid commission rate: {s}")))?;
        Self::new(value)
    }
}
