//! Conversion of a relative price window into a bin count.

use crate::constants::{BASIS_POINT_MAX, MAX_BINS_PER_SIDE};
use crate::error::MathError;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Bins per side of the center bin, derived once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWidth {
    /// Width actually used, `0 < bins <= MAX_BINS_PER_SIDE`.
    pub bins: u32,
    /// Width before clamping.
    pub requested: u64,
    /// Whether the request exceeded the protocol maximum.
    pub clamped: bool,
}

/// Computes `clamp(ceil(fraction * 10000 / bin_step), 1, MAX_BINS_PER_SIDE)`.
///
/// `fraction` is the half-width of the window, e.g. `0.05` for +/-5%.
pub fn range_width(fraction: Decimal, bin_step: u16) -> Result<RangeWidth, MathError> {
    if fraction <= Decimal::ZERO {
        return Err(MathError::NonPositiveFraction(fraction));
    }
    if bin_step == 0 {
        return Err(MathError::ZeroBinStep);
    }

    let raw = (fraction * Decimal::from(BASIS_POINT_MAX) / Decimal::from(bin_step)).ceil();
    let requested = raw.to_u64().ok_or(MathError::Overflow("range width"))?.max(1);
    let max = u64::from(MAX_BINS_PER_SIDE);

    Ok(RangeWidth {
        bins: requested.min(max) as u32,
        requested,
        clamped: requested > max,
    })
}
