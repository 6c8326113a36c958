//! Swap execution through the Jupiter aggregator.

use crate::SwapProvider;
use crate::http::{classify_reqwest_error, classify_status};
use crate::meteora::client::{from_raw_amount, to_raw_amount};
use crate::rpc::RpcProvider;
use crate::wallet::parse_pubkey;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dlmm_lp_domain::LedgerError;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default Jupiter v6 endpoint.
pub const DEFAULT_JUPITER_API_URL: &str = "https://quote-api.jup.ag/v6";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
}

/// Jupiter-routed swaps signed by the agent wallet.
pub struct JupiterSwap {
    client: Client,
    base_url: String,
    provider: Arc<RpcProvider>,
    payer: Arc<Keypair>,
    slippage_bps: u16,
}

impl JupiterSwap {
    /// Creates a new swap client.
    pub fn new(
        base_url: impl Into<String>,
        provider: Arc<RpcProvider>,
        payer: Arc<Keypair>,
        slippage_bps: u16,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            provider,
            payer,
            slippage_bps,
        }
    }

    async fn quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
    ) -> Result<Value, LedgerError> {
        let url = format!("{}/quote", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("inputMint", input_mint.to_string()),
                ("outputMint", output_mint.to_string()),
                ("amount", amount.to_string()),
                ("slippageBps", self.slippage_bps.to_string()),
            ])
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| LedgerError::Other(format!("malformed quote: {e}")))
    }

    async fn swap_transaction(&self, quote: &Value) -> Result<VersionedTransaction, LedgerError> {
        let url = format!("{}/swap", self.base_url);
        let body = json!({
            "quoteResponse": quote,
            "userPublicKey": self.payer.pubkey().to_string(),
            "wrapAndUnwrapSol": true,
            "dynamicComputeUnitLimit": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        let swap: SwapResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Other(format!("malformed swap response: {e}")))?;

        let bytes = STANDARD
            .decode(swap.swap_transaction)
            .map_err(|e| LedgerError::Other(format!("swap transaction is not base64: {e}")))?;
        let unsigned: VersionedTransaction = bincode::deserialize(&bytes)
            .map_err(|e| LedgerError::Other(format!("undecodable swap transaction: {e}")))?;

        VersionedTransaction::try_new(unsigned.message, &[self.payer.as_ref()])
            .map_err(|e| LedgerError::Other(format!("signing failed: {e}")))
    }
}

/// Reads `outAmount` (raw units, decimal string) from a quote.
fn quoted_out_amount(quote: &Value) -> Result<u64, LedgerError> {
    quote
        .get("outAmount")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| LedgerError::Other("quote is missing outAmount".to_string()))
}

#[async_trait]
impl SwapProvider for JupiterSwap {
    async fn swap(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let input_decimals = self
            .provider
            .get_mint_decimals(&parse_pubkey(input_mint)?)
            .await?;
        let output_decimals = self
            .provider
            .get_mint_decimals(&parse_pubkey(output_mint)?)
            .await?;

        let raw_in = to_raw_amount(amount, input_decimals)?;
        if raw_in == 0 {
            return Err(LedgerError::BadRequest(format!(
                "swap amount {amount} rounds to zero"
            )));
        }

        let quote = self.quote(input_mint, output_mint, raw_in).await?;
        let raw_out = quoted_out_amount(&quote)?;
        debug!(raw_in, raw_out, "Received swap quote");

        let transaction = self.swap_transaction(&quote).await?;
        let signature = self
            .provider
            .send_and_confirm_versioned(&transaction)
            .await?;

        let out = from_raw_amount(raw_out, output_decimals);
        info!(signature = %signature, amount_in = %amount, amount_out = %out, "Swap confirmed");
        Ok(out)
    }
}
