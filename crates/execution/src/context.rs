//! Collaborator bundle handed to the engine at construction.

use crate::alerts::Notifier;
use dlmm_lp_data::ActionLog;
use dlmm_lp_protocols::{LiquidityProvider, PoolMetadataSource, SwapProvider, WalletProvider};
use std::sync::Arc;

/// Every external capability the engine consumes.
#[derive(Clone)]
pub struct Collaborators {
    pub metadata: Arc<dyn PoolMetadataSource>,
    pub wallet: Arc<dyn WalletProvider>,
    pub swaps: Arc<dyn SwapProvider>,
    pub liquidity: Arc<dyn LiquidityProvider>,
    pub action_log: Arc<dyn ActionLog>,
    pub notifier: Arc<dyn Notifier>,
}
