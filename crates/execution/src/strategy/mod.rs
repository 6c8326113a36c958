//! Rebalancing strategy.
//!
//! - [`AssetBalancer`]: swaps wallet holdings to an even value split
//! - [`RebalanceLoop`]: decides each cycle whether the position must move

mod balancer;
mod decision;

pub use balancer::{AssetBalancer, BalancerConfig, SwapOutcome};
pub use decision::RebalanceLoop;
