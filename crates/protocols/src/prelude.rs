//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use dlmm_lp_protocols::prelude::*;
//! ```

// Contracts
pub use crate::{
    LiquidityProvider, PoolMetadata, PoolMetadataSource, RemovalOutcome, SwapProvider,
    WalletProvider,
};

// Jupiter
pub use crate::jupiter::{DEFAULT_JUPITER_API_URL, JupiterSwap};

// Meteora
pub use crate::meteora::{
    DEFAULT_METEORA_API_URL, DlmmClient, DlmmExecutor, LbPairState, MeteoraApi, PositionState,
};

// Solana
pub use crate::rpc::{PUBLIC_MAINNET_RPC, RpcProvider};
pub use crate::wallet::{SolanaWallet, load_keypair};
