//! Solana RPC provider with error classification.

use dlmm_lp_domain::LedgerError;
use dlmm_lp_domain::constants::{NATIVE_DECIMALS, WRAPPED_NATIVE_MINT};
use rust_decimal::Decimal;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcProgramAccountsConfig;
use solana_client::rpc_filter::RpcFilterType;
use solana_sdk::account::Account;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Public mainnet endpoint; too heavily rate limited for an unattended agent.
pub const PUBLIC_MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";

/// Offset of the `decimals` byte in an SPL mint account.
const MINT_DECIMALS_OFFSET: usize = 44;

/// Thin wrapper over the nonblocking RPC client.
pub struct RpcProvider {
    client: RpcClient,
    /// Mint decimals never change, so they are cached for the process lifetime.
    decimals: RwLock<HashMap<Pubkey, u8>>,
}

impl RpcProvider {
    /// Creates a provider with `confirmed` commitment.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.into(), CommitmentConfig::confirmed()),
            decimals: RwLock::new(HashMap::new()),
        }
    }

    /// Endpoint URL.
    pub fn url(&self) -> String {
        self.client.url()
    }

    /// Native balance in lamports.
    pub async fn get_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError> {
        self.client
            .get_balance(owner)
            .await
            .map_err(|e| classify_client_error(&e))
    }

    /// UI balance of an SPL token account. A missing account holds nothing.
    pub async fn get_token_balance(&self, token_account: &Pubkey) -> Result<Decimal, LedgerError> {
        match self.client.get_token_account_balance(token_account).await {
            Ok(amount) => Decimal::from_str(&amount.ui_amount_string)
                .map_err(|e| LedgerError::Other(format!("unparseable token amount: {e}"))),
            Err(e) if is_account_not_found(&e) => {
                debug!(account = %token_account, "Token account not found, treating as empty");
                Ok(Decimal::ZERO)
            }
            Err(e) => Err(classify_client_error(&e)),
        }
    }

    /// Raw account data.
    pub async fn get_account_data(&self, address: &Pubkey) -> Result<Vec<u8>, LedgerError> {
        self.client
            .get_account_data(address)
            .await
            .map_err(|e| classify_client_error(&e))
    }

    /// Whether an account exists at `address`.
    pub async fn account_exists(&self, address: &Pubkey) -> Result<bool, LedgerError> {
        match self.client.get_account_data(address).await {
            Ok(_) => Ok(true),
            Err(e) if is_account_not_found(&e) => Ok(false),
            Err(e) => Err(classify_client_error(&e)),
        }
    }

    /// Scans accounts owned by `program_id` matching every filter.
    pub async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> Result<Vec<(Pubkey, Account)>, LedgerError> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            ..Default::default()
        };
        self.client
            .get_program_accounts_with_config(program_id, config)
            .await
            .map_err(|e| classify_client_error(&e))
    }

    /// Decimals of `mint`, read once and cached.
    pub async fn get_mint_decimals(&self, mint: &Pubkey) -> Result<u8, LedgerError> {
        if mint.to_string() == WRAPPED_NATIVE_MINT {
            return Ok(NATIVE_DECIMALS);
        }
        if let Some(decimals) = self.decimals.read().await.get(mint) {
            return Ok(*decimals);
        }

        let data = self.get_account_data(mint).await?;
        let decimals = *data
            .get(MINT_DECIMALS_OFFSET)
            .ok_or_else(|| LedgerError::Other(format!("account {mint} is not a mint")))?;

        self.decimals.write().await.insert(*mint, decimals);
        Ok(decimals)
    }

    /// Latest blockhash.
    pub async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| classify_client_error(&e))
    }

    /// Sends a legacy transaction and waits for confirmation.
    pub async fn send_and_confirm(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, LedgerError> {
        let signature = self
            .client
            .send_and_confirm_transaction(transaction)
            .await
            .map_err(|e| classify_client_error(&e))?;
        info!(signature = %signature, "Transaction confirmed");
        Ok(signature)
    }

    /// Sends a versioned transaction and waits for confirmation.
    pub async fn send_and_confirm_versioned(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, LedgerError> {
        let signature = self
            .client
            .send_and_confirm_transaction(transaction)
            .await
            .map_err(|e| classify_client_error(&e))?;
        info!(signature = %signature, "Transaction confirmed");
        Ok(signature)
    }
}

fn is_account_not_found(err: &ClientError) -> bool {
    let message = err.to_string();
    message.contains("AccountNotFound") || message.contains("could not find account")
}

/// Maps an RPC client failure to an error kind.
pub fn classify_client_error(err: &ClientError) -> LedgerError {
    match err.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => {
            LedgerError::Transient(err.to_string())
        }
        _ => classify_message(err.to_string()),
    }
}

/// Maps a failure message from the node or a simulated transaction to an error kind.
pub fn classify_message(message: String) -> LedgerError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("insufficient funds")
        || lower.contains("insufficient lamports")
        || lower.contains("insufficientfundsforfee")
        || lower.contains("no record of a prior credit")
    {
        LedgerError::InsufficientFunds(message)
    } else if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("429")
        || lower.contains("too many requests")
        || lower.contains("blockhash not found")
        || lower.contains("node is behind")
        || lower.contains("service unavailable")
    {
        LedgerError::Transient(message)
    } else {
        LedgerError::Other(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_message() {
        assert!(
            classify_message("Transaction simulation failed: insufficient lamports 100".into())
                .is_insufficient_funds()
        );
        assert!(
            classify_message(
                "Attempt to debit an account but found no record of a prior credit.".into()
            )
            .is_insufficient_funds()
        );
        assert!(matches!(
            classify_message("HTTP status client error (429 Too Many Requests)".into()),
            LedgerError::Transient(_)
        ));
        assert!(matches!(
            classify_message("custom program error: 0x1771".into()),
            LedgerError::Other(_)
        ));
    }
}
