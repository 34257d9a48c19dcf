use crate::domain::money::Rate;
use crate::domain::order::SellerId;
use crate::domain::rates::InMemorySellerDirectory;
use crate::error::Result;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct SellerRateRow {
    seller: String,
    rate: String,
}

/// Loads a `seller, rate` CSV into an in-memory seller directory. Rates are
/// validated into `[0, 1]` on load.
pub fn read_seller_rates<R: Read>(source: R) -> Result<InMemorySellerDirectory> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut directory = InMemorySellerDirectory::new();
    for row in reader.deserialize() {
        let row: SellerRateRow = row?;
        let rate: Rate = row.rate.parse()?;
        directory.set_rate(SellerId(row.seller), rate);
    }
    Ok(directory)
}
