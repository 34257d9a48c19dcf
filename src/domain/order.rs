use serde::{Deserialize, Serialize};

/// Identifier of a marketplace seller. Sellers are owned by an external
/// registration system; this core only references them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SellerId(pub String);

impl std::fmt::Display for SellerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SellerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single line of a paid order. Prices are in the smallest currency unit.
///
/// `seller` is a typed optional reference: lines without one belong to the
/// platform itself and are excluded from splitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub price: i64,
    pub seller: Option<SellerId>,
}

/// A paid order as delivered by the external order system. Read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub total: i64,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Lines that carry a seller reference, in their original order.
    pub fn seller_lines(&self) -> impl Iterator<Item = (&SellerId, &OrderLine)> {
        self.lines
            .iter()
            .filter_map(|line| line.seller.as_ref().map(|seller| (seller, line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_lines_skip_platform_lines() {
        let order = Order {
            id: OrderId::from("o-1"),
            total: 3000,
            lines: vec![
                OrderLine {
                    id: "l-1".to_string(),
                    price: 1000,
                    seller: Some(SellerId::from("s-1")),
                },
                OrderLine {
                    id: "l-2".to_string(),
                    price: 2000,
                    seller: None,
                },
            ],
        };

        let owned: Vec<_> = order.seller_lines().collect();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].0, &SellerId::from("s-1"));
        assert_eq!(owned[0].1.price, 1000);
    }
}
