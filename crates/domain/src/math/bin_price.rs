use crate::constants::{BASIS_POINT_MAX, MAX_BIN_PER_ARRAY};
use crate::error::MathError;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Returns the UI price of token X in token Y for a bin.
/// P = (1 + bin_step / 10000) ^ bin_id * 10 ^ (decimals_x - decimals_y)
pub fn bin_id_to_price(
    bin_id: i32,
    bin_step: u16,
    decimals_x: u8,
    decimals_y: u8,
) -> Result<Decimal, MathError> {
    if bin_step == 0 {
        return Err(MathError::ZeroBinStep);
    }
    let base = 1.0 + f64::from(bin_step) / f64::from(BASIS_POINT_MAX);
    let raw = base.powi(bin_id);
    let scale = 10f64.powi(i32::from(decimals_x) - i32::from(decimals_y));
    Decimal::from_f64(raw * scale).ok_or(MathError::Overflow("bin price"))
}

/// Index of the bin array holding `bin_id` (floor division).
pub fn bin_array_index(bin_id: i32) -> i64 {
    i64::from(bin_id.div_euclid(MAX_BIN_PER_ARRAY))
}
