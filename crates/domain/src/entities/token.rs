//! Pool asset identity.

use crate::constants::NATIVE_SYMBOL;
use serde::{Deserialize, Serialize};

/// Identity of one pool asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenInfo {
    pub mint_address: String,
    pub symbol: String,
}

impl TokenInfo {
    pub fn new(mint: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            mint_address: mint.into(),
            symbol: symbol.into(),
        }
    }

    /// Whether this asset is the chain's native gas asset (case-insensitive).
    pub fn is_native(&self) -> bool {
        self.symbol.eq_ignore_ascii_case(NATIVE_SYMBOL)
    }
}
