//! [`LiquidityProvider`] implementation for Meteora DLMM.

use super::accounts::{
    LbPairState, POSITION_LB_PAIR_OFFSET, POSITION_OWNER_OFFSET, POSITION_V2_DISCRIMINATOR,
    PositionState,
};
use super::executor::{DlmmExecutor, OpenPositionParams};
use super::program::DLMM_PROGRAM_ID;
use crate::rpc::RpcProvider;
use crate::wallet::parse_pubkey;
use crate::{LiquidityProvider, RemovalOutcome, WalletProvider};
use async_trait::async_trait;
use dlmm_lp_domain::LedgerError;
use dlmm_lp_domain::entities::PositionInfo;
use dlmm_lp_domain::math::bin_id_to_price;
use dlmm_lp_domain::value_objects::ActiveBin;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::sync::Arc;
use tracing::{debug, info};

/// Default tolerance for active bin movement between quoting and execution.
pub const DEFAULT_MAX_ACTIVE_BIN_SLIPPAGE: i32 = 3;

/// DLMM liquidity operations for one wallet.
pub struct DlmmClient {
    provider: Arc<RpcProvider>,
    executor: DlmmExecutor,
    wallet: Arc<dyn WalletProvider>,
    payer: Arc<Keypair>,
    max_active_bin_slippage: i32,
}

impl DlmmClient {
    /// Creates a new client.
    pub fn new(
        provider: Arc<RpcProvider>,
        wallet: Arc<dyn WalletProvider>,
        payer: Arc<Keypair>,
        compute_unit_price: u64,
    ) -> Self {
        Self {
            executor: DlmmExecutor::new(provider.clone(), compute_unit_price),
            provider,
            wallet,
            payer,
            max_active_bin_slippage: DEFAULT_MAX_ACTIVE_BIN_SLIPPAGE,
        }
    }

    /// Reads and decodes the pool account.
    pub async fn load_pair(&self, pool_address: &str) -> Result<LbPairState, LedgerError> {
        let address = parse_pubkey(pool_address)?;
        let data = self.provider.get_account_data(&address).await?;
        LbPairState::parse(address, &data)
    }

    /// Lists this wallet's decoded positions on `lb_pair`.
    pub async fn position_states(
        &self,
        lb_pair: &Pubkey,
    ) -> Result<Vec<PositionState>, LedgerError> {
        let filters = vec![
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(0, POSITION_V2_DISCRIMINATOR.to_vec())),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                POSITION_LB_PAIR_OFFSET,
                lb_pair.to_bytes().to_vec(),
            )),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                POSITION_OWNER_OFFSET,
                self.payer.pubkey().to_bytes().to_vec(),
            )),
        ];

        let accounts = self
            .provider
            .get_program_accounts(&DLMM_PROGRAM_ID, filters)
            .await?;

        accounts
            .into_iter()
            .map(|(address, account)| PositionState::parse(address, &account.data))
            .collect()
    }

    async fn mint_decimals(&self, pair: &LbPairState) -> Result<(u8, u8), LedgerError> {
        let decimals_x = self.provider.get_mint_decimals(&pair.token_x_mint).await?;
        let decimals_y = self.provider.get_mint_decimals(&pair.token_y_mint).await?;
        Ok((decimals_x, decimals_y))
    }

    async fn wallet_balances(&self, pair: &LbPairState) -> Result<(Decimal, Decimal), LedgerError> {
        let x = self
            .wallet
            .get_balance(Some(&pair.token_x_mint.to_string()))
            .await?;
        let y = self
            .wallet
            .get_balance(Some(&pair.token_y_mint.to_string()))
            .await?;
        Ok((x, y))
    }
}

/// Converts a UI amount to raw token units, rounding down.
pub fn to_raw_amount(amount: Decimal, decimals: u8) -> Result<u64, LedgerError> {
    let scale = Decimal::from(10u64.pow(u32::from(decimals)));
    let scaled = (amount.max(Decimal::ZERO) * scale).floor();
    scaled
        .to_u64()
        .ok_or_else(|| LedgerError::Other(format!("amount {amount} overflows u64")))
}

/// Converts raw token units to a UI amount.
pub fn from_raw_amount(raw: u64, decimals: u8) -> Decimal {
    Decimal::from(raw) / Decimal::from(10u64.pow(u32::from(decimals)))
}

#[async_trait]
impl LiquidityProvider for DlmmClient {
    async fn get_positions(&self, pool_address: &str) -> Result<Vec<PositionInfo>, LedgerError> {
        let pair = parse_pubkey(pool_address)?;
        let positions = self.position_states(&pair).await?;
        debug!(pool = %pair, count = positions.len(), "Fetched positions");
        Ok(positions.iter().map(PositionState::info).collect())
    }

    async fn get_active_bin(&self, pool_address: &str) -> Result<ActiveBin, LedgerError> {
        let pair = self.load_pair(pool_address).await?;
        let (decimals_x, decimals_y) = self.mint_decimals(&pair).await?;
        let price = bin_id_to_price(pair.active_id, pair.bin_step, decimals_x, decimals_y)
            .map_err(|e| LedgerError::Other(e.to_string()))?;
        Ok(ActiveBin::new(pair.active_id, price))
    }

    async fn add_liquidity(
        &self,
        pool_address: &str,
        amount_a: Decimal,
        amount_b: Decimal,
        range_width: u32,
    ) -> Result<(), LedgerError> {
        let pair = self.load_pair(pool_address).await?;
        let (decimals_x, decimals_y) = self.mint_decimals(&pair).await?;
        let width = range_width as i32;

        let params = OpenPositionParams {
            lower_bin_id: pair.active_id - width,
            upper_bin_id: pair.active_id + width,
            active_id: pair.active_id,
            amount_x: to_raw_amount(amount_a, decimals_x)?,
            amount_y: to_raw_amount(amount_b, decimals_y)?,
            max_active_bin_slippage: self.max_active_bin_slippage,
        };

        let position = Keypair::new();
        self.executor
            .open_position(&pair, &params, &position, &self.payer)
            .await?;

        info!(position = %position.pubkey(), "Position opened");
        Ok(())
    }

    async fn remove_liquidity(
        &self,
        pool_address: &str,
        close_position: bool,
    ) -> Result<RemovalOutcome, LedgerError> {
        let pair = self.load_pair(pool_address).await?;
        let positions = self.position_states(&pair.address).await?;
        let position = positions.first().ok_or_else(|| {
            LedgerError::NoPositionFound(format!("no positions found in pool {pool_address}"))
        })?;
        let (decimals_x, decimals_y) = self.mint_decimals(&pair).await?;

        let before = self.wallet_balances(&pair).await?;
        self.executor
            .withdraw_position(
                &pair,
                &position.address,
                position.range,
                close_position,
                &self.payer,
            )
            .await?;
        let after = self.wallet_balances(&pair).await?;

        // Pending fees are a lower bound of what the claim pays out; the rest
        // of the wallet delta is withdrawn principal.
        let fees = (
            from_raw_amount(position.fee_x_pending, decimals_x),
            from_raw_amount(position.fee_y_pending, decimals_y),
        );
        let removed = (
            (after.0 - before.0 - fees.0).max(Decimal::ZERO),
            (after.1 - before.1 - fees.1).max(Decimal::ZERO),
        );

        Ok(RemovalOutcome {
            liquidity_removed: removed,
            fees_claimed: fees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_raw_amount_conversion() {
        assert_eq!(to_raw_amount(dec!(1.5), 9).unwrap(), 1_500_000_000);
        assert_eq!(to_raw_amount(dec!(0.0000001), 6).unwrap(), 0);
        assert_eq!(to_raw_amount(dec!(-1), 6).unwrap(), 0);
        assert_eq!(from_raw_amount(2_500_000, 6), dec!(2.5));
    }
}
