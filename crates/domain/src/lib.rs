//! Domain model for the DLMM liquidity agent.
//!
//! Pure types and math shared by every other crate: pool facts, position
//! bounds, balances, the ledger error taxonomy, bin range sizing and the
//! 50/50 swap planner. Nothing in here performs I/O.

/// Protocol constants.
pub mod constants;
/// Core entities.
pub mod entities;
/// Error taxonomy.
pub mod error;
/// Bin and balance math.
pub mod math;
/// Value objects.
pub mod value_objects;

pub use error::{LedgerError, MathError};
