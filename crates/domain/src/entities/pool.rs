use crate::entities::token::TokenInfo;
use serde::{Deserialize, Serialize};

/// Static facts about the managed pool, resolved once per agent lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDetails {
    pub address: String,
    /// Bin step in basis points.
    pub bin_step: u16,
    pub token_a: TokenInfo,
    pub token_b: TokenInfo,
}

impl PoolDetails {
    pub fn new(
        address: impl Into<String>,
        bin_step: u16,
        token_a: TokenInfo,
        token_b: TokenInfo,
    ) -> Self {
        Self {
            address: address.into(),
            bin_step,
            token_a,
            token_b,
        }
    }

    /// Human readable pair name, e.g. `SOL-USDC`.
    pub fn pair_name(&self) -> String {
        format!("{}-{}", self.token_a.symbol, self.token_b.symbol)
    }
}
