use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time observation of the bin holding the current market price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBin {
    pub bin_id: i32,
    /// Price of asset A denominated in asset B.
    pub price_per_unit: Decimal,
}

impl ActiveBin {
    pub fn new(bin_id: i32, price_per_unit: Decimal) -> Self {
        Self {
            bin_id,
            price_per_unit,
        }
    }
}
