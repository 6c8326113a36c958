//! Ledger-facing collaborators for the DLMM liquidity agent.
//!
//! This crate defines the narrow contracts the rebalancing engine consumes
//! and their Solana implementations:
//! - Wallet balance queries
//! - Swap execution through Jupiter
//! - Meteora DLMM pool metadata, active bin, positions and liquidity operations
//!
//! Every implementation classifies its transport failures into a
//! [`LedgerError`] kind at this boundary.

/// Prelude module for convenient imports.
pub mod prelude;

/// HTTP failure classification.
pub mod http;
/// Jupiter swap routing.
pub mod jupiter;
/// Meteora DLMM adapter.
pub mod meteora;
/// Solana RPC access.
pub mod rpc;
/// Wallet balances and key loading.
pub mod wallet;

use async_trait::async_trait;
use dlmm_lp_domain::LedgerError;
use dlmm_lp_domain::entities::PositionInfo;
use dlmm_lp_domain::value_objects::ActiveBin;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw pool facts as published by the pool metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetadata {
    pub bin_step: u16,
    pub mint_x: String,
    pub mint_y: String,
    /// Market identifier of the form `SYMBOL_A-SYMBOL_B`.
    pub name: String,
}

/// Amounts returned to the wallet when a position is withdrawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalOutcome {
    /// Principal withdrawn, `(asset A, asset B)`.
    pub liquidity_removed: (Decimal, Decimal),
    /// Swap fees claimed, `(asset A, asset B)`.
    pub fees_claimed: (Decimal, Decimal),
}

/// Source of static pool facts.
#[async_trait]
pub trait PoolMetadataSource: Send + Sync {
    /// Fetches the metadata for `pool_address`.
    async fn fetch_pool_metadata(&self, pool_address: &str) -> Result<PoolMetadata, LedgerError>;
}

/// Wallet holdings.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Returns the UI balance of `mint`, or of the native gas asset when `None`.
    async fn get_balance(&self, mint: Option<&str>) -> Result<Decimal, LedgerError>;
}

/// Swap execution and routing.
#[async_trait]
pub trait SwapProvider: Send + Sync {
    /// Sells `amount` of `input_mint` for `output_mint`, returning the output amount.
    async fn swap(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError>;
}

/// Concentrated-liquidity pool primitives.
#[async_trait]
pub trait LiquidityProvider: Send + Sync {
    /// Lists the wallet's positions on `pool_address`. An empty list is not an error.
    async fn get_positions(&self, pool_address: &str) -> Result<Vec<PositionInfo>, LedgerError>;

    /// Reads the bin holding the current price.
    async fn get_active_bin(&self, pool_address: &str) -> Result<ActiveBin, LedgerError>;

    /// Opens a position of `range_width` bins per side around the active bin
    /// at execution time and deposits both amounts into it.
    async fn add_liquidity(
        &self,
        pool_address: &str,
        amount_a: Decimal,
        amount_b: Decimal,
        range_width: u32,
    ) -> Result<(), LedgerError>;

    /// Withdraws all liquidity and fees from the wallet's position on
    /// `pool_address`, closing the position when `close_position` is set.
    async fn remove_liquidity(
        &self,
        pool_address: &str,
        close_position: bool,
    ) -> Result<RemovalOutcome, LedgerError>;
}
