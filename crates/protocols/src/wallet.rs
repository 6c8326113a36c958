//! Wallet key loading and balance queries.

use crate::WalletProvider;
use crate::meteora::program::{ATA_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::rpc::RpcProvider;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use dlmm_lp_domain::LedgerError;
use dlmm_lp_domain::constants::{NATIVE_DECIMALS, WRAPPED_NATIVE_MINT};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use std::str::FromStr;
use std::sync::Arc;
use zeroize::Zeroize;

/// Parses a keypair from the Solana CLI JSON byte-array format.
///
/// # Errors
/// Returns an error if the secret is not a valid 64-byte keypair.
pub fn load_keypair(secret: &str) -> Result<Keypair> {
    let mut bytes: Vec<u8> =
        serde_json::from_str(secret.trim()).context("keypair must be a JSON byte array")?;
    let keypair = Keypair::try_from(bytes.as_slice())
        .map_err(|e| anyhow!("invalid keypair bytes: {e}"));
    bytes.zeroize();
    keypair
}

/// Derives the associated token account of `owner` for `mint`.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    let (ata, _bump) = Pubkey::find_program_address(
        &[owner.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_ID,
    );
    ata
}

/// Parses a base58 address into a public key.
pub fn parse_pubkey(address: &str) -> Result<Pubkey, LedgerError> {
    Pubkey::from_str(address)
        .map_err(|e| LedgerError::BadRequest(format!("invalid address {address}: {e}")))
}

/// Balance reader for a single wallet.
pub struct SolanaWallet {
    provider: Arc<RpcProvider>,
    owner: Pubkey,
}

impl SolanaWallet {
    /// Creates a wallet reader for `owner`.
    pub fn new(provider: Arc<RpcProvider>, owner: Pubkey) -> Self {
        Self { provider, owner }
    }

    /// Wallet address.
    pub fn owner(&self) -> Pubkey {
        self.owner
    }

    async fn native_balance(&self) -> Result<Decimal, LedgerError> {
        let lamports = self.provider.get_balance(&self.owner).await?;
        Ok(Decimal::from(lamports) / Decimal::from(10u64.pow(u32::from(NATIVE_DECIMALS))))
    }
}

#[async_trait]
impl WalletProvider for SolanaWallet {
    async fn get_balance(&self, mint: Option<&str>) -> Result<Decimal, LedgerError> {
        match mint {
            // Wrapped SOL is unwrapped after every withdrawal, so the native
            // balance is the spendable amount.
            None => self.native_balance().await,
            Some(mint) if mint == WRAPPED_NATIVE_MINT => self.native_balance().await,
            Some(mint) => {
                let mint = parse_pubkey(mint)?;
                let ata = associated_token_address(&self.owner, &mint);
                self.provider.get_token_balance(&ata).await
            }
        }
    }
}
