//! Asset balancing toward a 50/50 value split.

use crate::error::EngineError;
use crate::lifecycle::{EventData, Journal, LifecycleEvent, SwapData};
use crate::retry::{RetryPolicy, retry};
use dlmm_lp_domain::entities::PoolDetails;
use dlmm_lp_domain::math::{SwapDirection, plan_rebalance_swap};
use dlmm_lp_domain::value_objects::UsableBalances;
use dlmm_lp_protocols::SwapProvider;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Configuration for balancing.
#[derive(Debug, Clone, Copy)]
pub struct BalancerConfig {
    /// Excess value, as a fraction of total value, that is left unswapped.
    pub tolerance: Decimal,
    /// Retry policy for the swap call.
    pub retry: RetryPolicy,
    /// Wait after a swap before balances are read again.
    pub settle_delay: Duration,
}

/// A completed rebalancing swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub direction: SwapDirection,
    pub input_symbol: String,
    pub output_symbol: String,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
}

/// Swaps the excess of one asset into the other.
pub struct AssetBalancer {
    swaps: Arc<dyn SwapProvider>,
    journal: Journal,
    config: BalancerConfig,
}

impl AssetBalancer {
    pub fn new(swaps: Arc<dyn SwapProvider>, journal: Journal, config: BalancerConfig) -> Self {
        Self {
            swaps,
            journal,
            config,
        }
    }

    /// Brings `balances` to equal value at `price` (A in B).
    ///
    /// Issues at most one swap. Returns `None` when the balances are already
    /// within tolerance of the target split.
    pub async fn balance(
        &self,
        pool: &PoolDetails,
        balances: &UsableBalances,
        price: Decimal,
    ) -> Result<Option<SwapOutcome>, EngineError> {
        let amount_a = balances.get(&pool.token_a.symbol);
        let amount_b = balances.get(&pool.token_b.symbol);

        let Some(plan) = plan_rebalance_swap(amount_a, amount_b, price, self.config.tolerance)?
        else {
            debug!(%amount_a, %amount_b, %price, "Balances already split evenly");
            return Ok(None);
        };

        let (input, output) = match plan.direction {
            SwapDirection::AToB => (&pool.token_a, &pool.token_b),
            SwapDirection::BToA => (&pool.token_b, &pool.token_a),
        };
        info!(
            input = %input.symbol,
            output = %output.symbol,
            amount_in = %plan.amount_in,
            total_value = %plan.total_value,
            "Rebalancing assets"
        );

        let amount_out = retry(self.config.retry, "swap", || {
            self.swaps
                .swap(&input.mint_address, &output.mint_address, plan.amount_in)
        })
        .await?;

        let outcome = SwapOutcome {
            direction: plan.direction,
            input_symbol: input.symbol.clone(),
            output_symbol: output.symbol.clone(),
            amount_in: plan.amount_in,
            amount_out,
        };
        self.journal
            .record(LifecycleEvent::new(
                &pool.address,
                EventData::Swapped(SwapData {
                    input_symbol: outcome.input_symbol.clone(),
                    output_symbol: outcome.output_symbol.clone(),
                    amount_in: outcome.amount_in,
                    amount_out: outcome.amount_out,
                }),
            ))
            .await;

        sleep(self.config.settle_delay).await;
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, sol_usdc_pool};
    use dlmm_lp_domain::LedgerError;
    use rust_decimal_macros::dec;

    fn balances(sol: Decimal, usdc: Decimal) -> UsableBalances {
        let mut balances = UsableBalances::new();
        balances.insert("SOL", sol);
        balances.insert("USDC", usdc);
        balances
    }

    #[tokio::test]
    async fn test_swaps_excess_a_into_b() {
        let harness = Harness::new();
        harness.ledger.set_swap_output(dec!(19.87));
        let balancer = harness.balancer();

        let outcome = balancer
            .balance(&sol_usdc_pool(), &balances(dec!(10), dec!(0)), dec!(2))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.direction, SwapDirection::AToB);
        assert_eq!(outcome.amount_in, dec!(5));
        assert_eq!(outcome.amount_out, dec!(19.87));
        assert_eq!(harness.ledger.swaps().len(), 1);

        let lines = harness.action_log.lines().await;
        assert_eq!(lines, vec!["Swapped 5 SOL for 19.87 USDC".to_string()]);
    }

    #[tokio::test]
    async fn test_swaps_excess_b_into_a() {
        let harness = Harness::new();
        let balancer = harness.balancer();

        let outcome = balancer
            .balance(&sol_usdc_pool(), &balances(dec!(1), dec!(300)), dec!(100))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.direction, SwapDirection::BToA);
        assert_eq!(outcome.amount_in, dec!(100));
        assert_eq!(outcome.input_symbol, "USDC");
    }

    #[tokio::test]
    async fn test_balanced_wallet_issues_no_swap() {
        let harness = Harness::new();
        let balancer = harness.balancer();

        let outcome = balancer
            .balance(&sol_usdc_pool(), &balances(dec!(5), dec!(10.01)), dec!(2))
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert!(harness.ledger.swaps().is_empty());
        assert!(harness.action_log.lines().await.is_empty());
    }

    #[tokio::test]
    async fn test_swap_funds_error_is_not_retried() {
        let harness = Harness::new();
        harness
            .ledger
            .fail_swaps_with(LedgerError::InsufficientFunds("fee".into()), 10);
        let balancer = harness.balancer();

        let err = balancer
            .balance(&sol_usdc_pool(), &balances(dec!(10), dec!(0)), dec!(2))
            .await
            .unwrap_err();

        assert!(err.is_insufficient_funds());
        assert_eq!(harness.ledger.swap_attempts(), 1);
    }
}
