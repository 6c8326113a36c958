//! Pool metadata resolution into typed pool details.

use crate::error::EngineError;
use dlmm_lp_domain::entities::{PoolDetails, TokenInfo};
use dlmm_lp_protocols::{PoolMetadata, PoolMetadataSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Splits a `SYMBOL_A-SYMBOL_B` market identifier.
///
/// # Errors
/// Returns [`EngineError::MalformedPoolMetadata`] unless the split yields
/// exactly two non-empty symbols.
pub fn parse_pair_name(name: &str) -> Result<(String, String), EngineError> {
    let parts: Vec<&str> = name.split('-').map(str::trim).collect();
    match parts.as_slice() {
        [a, b] if !a.is_empty() && !b.is_empty() => Ok((a.to_string(), b.to_string())),
        _ => Err(EngineError::MalformedPoolMetadata(format!(
            "expected SYMBOL_A-SYMBOL_B, got {name:?}"
        ))),
    }
}

/// Builds [`PoolDetails`] from the metadata service's answer.
///
/// # Errors
/// Fails when a mint is missing, the bin step is zero, or the name is malformed.
pub fn pool_details_from_metadata(
    pool_address: &str,
    metadata: &PoolMetadata,
) -> Result<PoolDetails, EngineError> {
    if metadata.mint_x.trim().is_empty() || metadata.mint_y.trim().is_empty() {
        return Err(EngineError::MissingTokenIdentity);
    }
    if metadata.bin_step == 0 {
        return Err(EngineError::MalformedPoolMetadata(
            "bin step must be non-zero".to_string(),
        ));
    }
    let (symbol_a, symbol_b) = parse_pair_name(&metadata.name)?;

    Ok(PoolDetails::new(
        pool_address,
        metadata.bin_step,
        TokenInfo::new(metadata.mint_x.trim(), symbol_a),
        TokenInfo::new(metadata.mint_y.trim(), symbol_b),
    ))
}

/// Resolves and caches pool details. Fetch failures are not retried here.
pub struct PoolResolver {
    source: Arc<dyn PoolMetadataSource>,
    cache: RwLock<HashMap<String, PoolDetails>>,
}

impl PoolResolver {
    pub fn new(source: Arc<dyn PoolMetadataSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the details for `pool_address`, fetching them on first use.
    pub async fn resolve(&self, pool_address: &str) -> Result<PoolDetails, EngineError> {
        if let Some(details) = self.cache.read().await.get(pool_address) {
            return Ok(details.clone());
        }

        let metadata = self.source.fetch_pool_metadata(pool_address).await?;
        let details = pool_details_from_metadata(pool_address, &metadata)?;
        info!(
            pool = %pool_address,
            pair = %details.pair_name(),
            bin_step = details.bin_step,
            "Resolved pool metadata"
        );

        self.cache
            .write()
            .await
            .insert(pool_address.to_string(), details.clone());
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dlmm_lp_domain::LedgerError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingSource {
        name: String,
        calls: AtomicU32,
    }

    #[async_trait]
    impl PoolMetadataSource for CountingSource {
        async fn fetch_pool_metadata(&self, _pool: &str) -> Result<PoolMetadata, LedgerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PoolMetadata {
                bin_step: 25,
                mint_x: "mint-x".into(),
                mint_y: "mint-y".into(),
                name: self.name.clone(),
            })
        }
    }

    #[test]
    fn test_parse_pair_name() {
        assert_eq!(
            parse_pair_name("SOL-USDC").unwrap(),
            ("SOL".to_string(), "USDC".to_string())
        );
        for bad in ["SOLUSDC", "SOL-", "-USDC", "A-B-C", ""] {
            assert!(
                matches!(parse_pair_name(bad), Err(EngineError::MalformedPoolMetadata(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_mint_is_rejected() {
        let metadata = PoolMetadata {
            bin_step: 10,
            mint_x: String::new(),
            mint_y: "mint-y".into(),
            name: "SOL-USDC".into(),
        };
        assert!(matches!(
            pool_details_from_metadata("pool", &metadata),
            Err(EngineError::MissingTokenIdentity)
        ));
    }

    #[tokio::test]
    async fn test_resolver_caches_details() {
        let source = Arc::new(CountingSource {
            name: "SOL-USDC".into(),
            calls: AtomicU32::new(0),
        });
        let resolver = PoolResolver::new(source.clone());

        let first = resolver.resolve("pool").await.unwrap();
        let second = resolver.resolve("pool").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.token_a.symbol, "SOL");
        assert_eq!(first.token_b.mint_address, "mint-y");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolver_does_not_cache_failures() {
        let source = Arc::new(CountingSource {
            name: "SOLUSDC".into(),
            calls: AtomicU32::new(0),
        });
        let resolver = PoolResolver::new(source.clone());

        assert!(resolver.resolve("pool").await.is_err());
        assert!(resolver.resolve("pool").await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
