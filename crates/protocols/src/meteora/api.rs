//! Meteora DLMM HTTP API client.

use crate::http::{classify_reqwest_error, classify_status};
use crate::{PoolMetadata, PoolMetadataSource};
use async_trait::async_trait;
use dlmm_lp_domain::LedgerError;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default public API endpoint.
pub const DEFAULT_METEORA_API_URL: &str = "https://dlmm-api.meteora.ag";

/// Client for `GET /pair/{address}`.
pub struct MeteoraApi {
    client: Client,
    base_url: String,
}

impl MeteoraApi {
    /// Creates a client against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for MeteoraApi {
    fn default() -> Self {
        Self::new(DEFAULT_METEORA_API_URL)
    }
}

#[async_trait]
impl PoolMetadataSource for MeteoraApi {
    async fn fetch_pool_metadata(&self, pool_address: &str) -> Result<PoolMetadata, LedgerError> {
        let url = format!("{}/pair/{}", self.base_url, pool_address);
        debug!(url = %url, "Fetching pool metadata");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        response
            .json::<PoolMetadata>()
            .await
            .map_err(|e| LedgerError::Other(format!("malformed pool metadata response: {e}")))
    }
}
