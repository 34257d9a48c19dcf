use crate::domain::payout::Payout;
use crate::error::Result;
use std::io::Write;

/// Writes payout records as CSV: `id,order,seller,amount,commission,status`.
pub struct PayoutWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PayoutWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_payouts(&mut self, payouts: &[Payout]) -> Result<()> {
        self.writer
            .write_record(["id", "order", "seller", "amount", "commission", "status"])?;
        for payout in payouts {
            self.writer.write_record([
                payout.id.to_string(),
                payout.order_id.to_string(),
                payout.seller_id.to_string(),
                payout.amount.to_string(),
                payout.commission.to_string(),
                payout.status.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
