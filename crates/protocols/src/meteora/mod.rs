//! Meteora DLMM protocol adapter.
//!
//! This module provides functionality to interact with DLMM pools:
//! - Read pool metadata from the Meteora API
//! - Read pool and position accounts
//! - Execute LP operations
//! - Implement the liquidity contract on top of them

/// On-chain account layouts.
pub mod accounts;
/// Pool metadata API client.
pub mod api;
/// Liquidity contract implementation.
pub mod client;
/// Transaction builder and sender.
pub mod executor;
/// Program ids and PDA derivation.
pub mod program;

pub use accounts::{LbPairState, PositionState};
pub use api::{DEFAULT_METEORA_API_URL, MeteoraApi};
pub use client::DlmmClient;
pub use executor::DlmmExecutor;
