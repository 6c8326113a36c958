//! Rebalancing engine for a single Meteora DLMM position.
//!
//! This crate keeps one concentrated-liquidity position centered on the
//! current price:
//! - Retry policies around every ledger call
//! - Pool metadata resolution and usable balance reads
//! - 50/50 asset balancing through swaps
//! - Position lifecycle: adopt, create, relocate
//! - Per-cycle rebalance decisions and the agent run loop
//! - Alerts and the action log

/// Prelude module for convenient imports.
pub mod prelude;

/// Alert system.
pub mod alerts;
/// Engine configuration and timing.
pub mod config;
/// Collaborator bundle.
pub mod context;
/// Engine errors.
pub mod error;
/// Position lifecycle tracking and control.
pub mod lifecycle;
/// Pool metadata and balances.
pub mod pool;
/// Retry executor.
pub mod retry;
/// Agent run loop.
pub mod scheduler;
/// Rebalancing strategy.
pub mod strategy;

#[cfg(test)]
mod testing;
