use crate::domain::order::{Order, OrderId, OrderLine, SellerId};
use crate::error::PayoutError;
use serde::Deserialize;
use std::io::Read;

/// One CSV row of a paid order. An empty `seller` field marks a
/// platform-owned line.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OrderLineRow {
    pub order: String,
    pub line: String,
    pub price: i64,
    pub seller: Option<String>,
}

/// Streams order-line rows from CSV input.
pub struct OrderReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OrderReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn rows(self) -> impl Iterator<Item = Result<OrderLineRow, PayoutError>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PayoutError::from))
    }
}

/// Groups consecutive rows with the same order id into one order. A later,
/// non-consecutive run of the same id becomes a separate notification for
/// that order, which is exactly what the idempotent entry point absorbs.
pub fn group_rows(rows: Vec<OrderLineRow>) -> Vec<Order> {
    let mut orders: Vec<Order> = Vec::new();

    for row in rows {
        let line = OrderLine {
            id: row.line,
            price: row.price,
            seller: row.seller.filter(|s| !s.is_empty()).map(SellerId),
        };

        match orders.last_mut() {
            Some(order) if order.id.0 == row.order => {
                order.total += line.price;
                order.lines.push(line);
            }
            _ => orders.push(Order {
                id: OrderId(row.order),
                total: line.price,
                lines: vec![line],
            }),
        }
    }

    orders
}
