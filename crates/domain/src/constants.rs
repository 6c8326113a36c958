//! Protocol-level constants for Meteora DLMM pools.

/// Denominator of the bin step, which is expressed in basis points.
pub const BASIS_POINT_MAX: u32 = 10_000;

/// Maximum number of bins on each side of the center bin.
///
/// A DLMM position holds at most 70 bins, so `2 * 34 + 1 = 69` is the widest
/// symmetric range that fits in a single position account.
pub const MAX_BINS_PER_SIDE: u32 = 34;

/// Number of bins stored in one on-chain bin array.
pub const MAX_BIN_PER_ARRAY: i32 = 70;

/// Symbol of the chain's native gas asset.
pub const NATIVE_SYMBOL: &str = "SOL";

/// Mint of wrapped SOL.
pub const WRAPPED_NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";

/// Decimals of the native gas asset.
pub const NATIVE_DECIMALS: u8 = 9;
