//! One-shot status report.

use crate::agent::Services;
use crate::config::AgentConfig;
use anyhow::{Context, Result};
use dlmm_lp_execution::prelude::{BalanceAccessor, PoolResolver};
use dlmm_lp_protocols::LiquidityProvider;

const RECENT_ACTIONS: i64 = 10;

/// Prints balances, the active bin and the wallet's positions.
pub async fn print_status(config: &AgentConfig, services: &Services) -> Result<()> {
    let collaborators = &services.collaborators;
    let pool = PoolResolver::new(collaborators.metadata.clone())
        .resolve(&config.pool_address)
        .await
        .context("failed to resolve pool metadata")?;
    let balances = BalanceAccessor::new(collaborators.wallet.clone(), config.fee_buffer);

    let usable = balances.usable_balances(&pool).await?;
    let native = balances.native_balance().await?;
    let active = collaborators
        .liquidity
        .get_active_bin(&pool.address)
        .await?;
    let positions = collaborators.liquidity.get_positions(&pool.address).await?;

    println!("Pool:            {} ({})", pool.pair_name(), pool.address);
    println!("Bin step:        {} bp", pool.bin_step);
    println!(
        "Active bin:      {} (1 {} = {} {})",
        active.bin_id,
        pool.token_a.symbol,
        active.price_per_unit.round_dp(6).normalize(),
        pool.token_b.symbol
    );
    println!("Native balance:  {}", native.normalize());
    println!("Usable balances: {usable}");
    println!(
        "Usable value:    {} {}",
        usable
            .total_value(&pool, active.price_per_unit)
            .round_dp(6)
            .normalize(),
        pool.token_b.symbol
    );

    if positions.is_empty() {
        println!("Positions:       none");
    } else {
        println!("Positions:");
        for position in &positions {
            let state = if position.range.contains(active.bin_id) {
                "in range"
            } else {
                "OUT OF RANGE"
            };
            println!(
                "  {} {} ({} bins) {}",
                position.address,
                position.range,
                position.range.bin_count(),
                state
            );
        }
    }

    if let Some(db) = &services.database {
        let recent = db.actions().find_recent(RECENT_ACTIONS).await?;
        if !recent.is_empty() {
            println!("Recent actions:");
            for action in recent {
                println!(
                    "  {} {}",
                    action.created_at.format("%Y-%m-%d %H:%M:%S"),
                    action.message
                );
            }
        }
    }
    Ok(())
}
