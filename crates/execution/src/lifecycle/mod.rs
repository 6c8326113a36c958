//! Position lifecycle.
//!
//! Tracks and drives the managed position:
//! - Position opening and relocation
//! - Liquidity withdrawals and fee claims
//! - Swaps made to rebalance the wallet
//! - Reporting to the action log and alert channels

mod controller;
mod events;
mod journal;
mod tracker;

pub use controller::{PositionController, PositionState};
pub use events::*;
pub use journal::Journal;
pub use tracker::*;
