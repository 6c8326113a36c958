//! Wallet balances net of the native fee buffer.

use dlmm_lp_domain::LedgerError;
use dlmm_lp_domain::entities::PoolDetails;
use dlmm_lp_domain::value_objects::UsableBalances;
use dlmm_lp_protocols::WalletProvider;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Reads wallet holdings net of the native fee buffer.
pub struct BalanceAccessor {
    wallet: Arc<dyn WalletProvider>,
    fee_buffer: Decimal,
}

impl BalanceAccessor {
    pub fn new(wallet: Arc<dyn WalletProvider>, fee_buffer: Decimal) -> Self {
        Self { wallet, fee_buffer }
    }

    /// Usable balances of both pool assets.
    ///
    /// The native asset has the fee buffer subtracted, floored at zero.
    pub async fn usable_balances(&self, pool: &PoolDetails) -> Result<UsableBalances, LedgerError> {
        let mut balances = UsableBalances::new();
        for token in [&pool.token_a, &pool.token_b] {
            let raw = self.wallet.get_balance(Some(&token.mint_address)).await?;
            let usable = if token.is_native() {
                (raw - self.fee_buffer).max(Decimal::ZERO)
            } else {
                raw
            };
            balances.insert(token.symbol.clone(), usable);
        }
        debug!(balances = %balances, "Read usable balances");
        Ok(balances)
    }

    /// Raw native balance, without the buffer.
    pub async fn native_balance(&self) -> Result<Decimal, LedgerError> {
        self.wallet.get_balance(None).await
    }
}
