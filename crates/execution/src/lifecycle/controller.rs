//! Position lifecycle controller.
//!
//! Owns the only cached ledger fact, the bounds of the tracked position, and
//! sequences every mutating operation:
//! - `load_initial_state`: adopt the existing position or create one
//! - `relocate`: withdraw, rebalance 50/50, re-create around the current price

use super::{AmountsData, EventData, Journal, LifecycleEvent, PositionOpenedData, RelocationData};
use crate::alerts::AlertLevel;
use crate::config::{EngineConfig, EngineTiming};
use crate::context::Collaborators;
use crate::error::EngineError;
use crate::pool::{BalanceAccessor, PoolResolver};
use crate::retry::{retry, wait_for_positions};
use crate::strategy::{AssetBalancer, BalancerConfig};
use dlmm_lp_domain::constants::MAX_BINS_PER_SIDE;
use dlmm_lp_domain::entities::{PoolDetails, PositionRange};
use dlmm_lp_domain::math::{RangeWidth, range_width};
use dlmm_lp_domain::value_objects::{BalanceSnapshot, UsableBalances};
use dlmm_lp_protocols::{LiquidityProvider, RemovalOutcome};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Whether the controller tracks a live position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    NoPosition,
    HasPosition(PositionRange),
}

impl PositionState {
    /// Bounds of the tracked position, if any.
    pub fn range(&self) -> Option<PositionRange> {
        match self {
            Self::NoPosition => None,
            Self::HasPosition(range) => Some(*range),
        }
    }
}

/// Drives the position through its lifecycle.
pub struct PositionController {
    config: EngineConfig,
    timing: EngineTiming,
    liquidity: Arc<dyn LiquidityProvider>,
    resolver: PoolResolver,
    balances: BalanceAccessor,
    balancer: AssetBalancer,
    journal: Journal,
    pool: Option<PoolDetails>,
    range_width: Option<RangeWidth>,
    state: PositionState,
    /// Wallet valuation taken right before the tracked position's deposit.
    entry_snapshot: Option<BalanceSnapshot>,
}

impl PositionController {
    /// Creates a controller in the `NoPosition` state.
    pub fn new(
        config: EngineConfig,
        timing: EngineTiming,
        collaborators: &Collaborators,
        journal: Journal,
    ) -> Self {
        let balancer = AssetBalancer::new(
            collaborators.swaps.clone(),
            journal.clone(),
            BalancerConfig {
                tolerance: config.swap_tolerance,
                retry: timing.retry,
                settle_delay: timing.settle_delay,
            },
        );
        Self {
            resolver: PoolResolver::new(collaborators.metadata.clone()),
            balances: BalanceAccessor::new(collaborators.wallet.clone(), config.fee_buffer),
            liquidity: collaborators.liquidity.clone(),
            balancer,
            journal,
            config,
            timing,
            pool: None,
            range_width: None,
            state: PositionState::NoPosition,
            entry_snapshot: None,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn balances(&self) -> &BalanceAccessor {
        &self.balances
    }

    /// Pool details, once resolved.
    pub fn pool(&self) -> Option<&PoolDetails> {
        self.pool.as_ref()
    }

    /// Bins per side used for new positions, once computed.
    pub fn range_width(&self) -> Option<u32> {
        self.range_width.map(|w| w.bins)
    }

    /// Resolves pool metadata and the range width on first use.
    async fn ensure_pool(&mut self) -> Result<(PoolDetails, u32), EngineError> {
        let pool = match self.pool.clone() {
            Some(pool) => pool,
            None => {
                let pool = self.resolver.resolve(&self.config.pool_address).await?;
                self.pool = Some(pool.clone());
                pool
            }
        };

        let width = match self.range_width {
            Some(width) => width,
            None => {
                let width = range_width(self.config.range_fraction, pool.bin_step)?;
                if width.clamped {
                    let message = format!(
                        "Range of {} bins per side exceeds the maximum of {}; using {}",
                        width.requested, MAX_BINS_PER_SIDE, width.bins
                    );
                    warn!(requested = width.requested, bins = width.bins, "Range width clamped");
                    self.journal.alert(AlertLevel::Warning, &message).await;
                }
                info!(
                    fraction = %self.config.range_fraction,
                    bin_step = pool.bin_step,
                    bins = width.bins,
                    "Computed range width"
                );
                self.range_width = Some(width);
                width
            }
        };

        Ok((pool, width.bins))
    }

    /// Synchronizes with the ledger at startup or after a desync.
    ///
    /// Adopts the first existing position on the pool, or creates one when
    /// there is none. Returns `true` when a position was created.
    pub async fn load_initial_state(&mut self) -> Result<bool, EngineError> {
        let (pool, width) = self.ensure_pool().await?;

        let positions = wait_for_positions(
            self.liquidity.as_ref(),
            &pool.address,
            self.timing.startup_lookup,
        )
        .await?;

        if let Some(first) = positions.first() {
            if positions.len() > 1 {
                warn!(count = positions.len(), "Multiple positions on pool, tracking the first");
            }
            self.state = PositionState::HasPosition(first.range);
            info!(position = %first.address, range = %first.range, "Adopted existing position");
            self.journal
                .note(&format!(
                    "Adopted existing position {} over bins {}",
                    first.address, first.range
                ))
                .await;
            return Ok(false);
        }

        self.state = PositionState::NoPosition;
        info!(pool = %pool.address, "No position found, creating one");
        let range = self.open_position(&pool, width).await?;
        self.journal
            .alert(
                AlertLevel::Info,
                &format!("Position created on {} over bins {}", pool.pair_name(), range),
            )
            .await;
        Ok(true)
    }

    /// Moves the tracked position to a range around the current price.
    ///
    /// A failure part-way leaves the controller in whatever state the last
    /// completed step produced; the next cycle re-synchronizes.
    pub async fn relocate(&mut self) -> Result<PositionRange, EngineError> {
        let PositionState::HasPosition(old_range) = self.state else {
            return Err(EngineError::NoActivePosition);
        };
        let (pool, width) = self.ensure_pool().await?;

        info!(pool = %pool.address, range = %old_range, "Withdrawing position");
        let outcome = retry(self.timing.retry, "remove liquidity", || {
            self.liquidity.remove_liquidity(&pool.address, true)
        })
        .await?;
        self.state = PositionState::NoPosition;
        self.record_removal(&pool, &outcome).await;

        sleep(self.timing.settle_delay).await;

        let active = retry(self.timing.retry, "get active bin", || {
            self.liquidity.get_active_bin(&pool.address)
        })
        .await?;
        let balances = self.read_balances(&pool).await?;
        let exit = BalanceSnapshot::capture(&pool, &balances, active.price_per_unit);
        self.journal.snapshot(&exit).await;
        self.journal
            .note(&format!(
                "Usable balances after withdrawal: {} (value {} {})",
                balances,
                exit.total_value.round_dp(6).normalize(),
                pool.token_b.symbol
            ))
            .await;
        self.check_for_loss(&pool, &exit).await;

        let new_range = self.open_position(&pool, width).await?;
        self.journal
            .record(LifecycleEvent::new(
                &pool.address,
                EventData::Relocated(RelocationData {
                    old_range,
                    new_range,
                    active_bin: active.bin_id,
                }),
            ))
            .await;
        Ok(new_range)
    }

    /// Balances the wallet 50/50, checks the fee reserve and opens a position.
    async fn open_position(
        &mut self,
        pool: &PoolDetails,
        width: u32,
    ) -> Result<PositionRange, EngineError> {
        let active = retry(self.timing.retry, "get active bin", || {
            self.liquidity.get_active_bin(&pool.address)
        })
        .await?;
        let price = active.price_per_unit;

        let mut balances = self.read_balances(pool).await?;
        if self.balancer.balance(pool, &balances, price).await?.is_some() {
            balances = self.read_balances(pool).await?;
        }

        self.verify_fee_reserve().await?;

        let amount_a = balances.get(&pool.token_a.symbol);
        let amount_b = balances.get(&pool.token_b.symbol);
        let entry = BalanceSnapshot::capture(pool, &balances, price);
        self.journal.snapshot(&entry).await;

        info!(
            active_bin = active.bin_id,
            width,
            %amount_a,
            %amount_b,
            "Adding liquidity"
        );
        retry(self.timing.retry, "add liquidity", || {
            self.liquidity
                .add_liquidity(&pool.address, amount_a, amount_b, width)
        })
        .await?;

        let positions = wait_for_positions(
            self.liquidity.as_ref(),
            &pool.address,
            self.timing.confirmation,
        )
        .await?;
        let created = positions.first().ok_or(EngineError::PositionNotVisible)?;
        let range = created.range;

        self.state = PositionState::HasPosition(range);
        self.entry_snapshot = Some(entry);
        self.journal
            .record(LifecycleEvent::new(
                &pool.address,
                EventData::PositionOpened(PositionOpenedData {
                    range,
                    active_bin: active.bin_id,
                    amounts: amounts(pool, (amount_a, amount_b)),
                    entry_price: price,
                }),
            ))
            .await;
        Ok(range)
    }

    async fn read_balances(&self, pool: &PoolDetails) -> Result<UsableBalances, EngineError> {
        Ok(retry(self.timing.retry, "read balances", || {
            self.balances.usable_balances(pool)
        })
        .await?)
    }

    /// Fails unless the raw native balance covers position creation.
    async fn verify_fee_reserve(&self) -> Result<(), EngineError> {
        let available = retry(self.timing.retry, "read native balance", || {
            self.balances.native_balance()
        })
        .await?;
        let required = self.config.min_native_balance;

        if available < required {
            let err = EngineError::InsufficientFundsForPositionFees {
                required,
                available,
            };
            error!(%required, %available, "Insufficient native balance for position fees");
            self.journal.alert(AlertLevel::Error, &err.to_string()).await;
            return Err(err);
        }
        Ok(())
    }

    async fn record_removal(&self, pool: &PoolDetails, outcome: &RemovalOutcome) {
        self.journal
            .record(LifecycleEvent::new(
                &pool.address,
                EventData::LiquidityRemoved(amounts(pool, outcome.liquidity_removed)),
            ))
            .await;
        self.journal
            .record(LifecycleEvent::new(
                &pool.address,
                EventData::FeesClaimed(amounts(pool, outcome.fees_claimed)),
            ))
            .await;
    }

    /// Compares the withdrawal valuation with the one taken at deposit.
    async fn check_for_loss(&mut self, pool: &PoolDetails, exit: &BalanceSnapshot) {
        let Some(entry) = self.entry_snapshot.take() else {
            return;
        };
        let delta = exit.total_value - entry.total_value;
        if delta < Decimal::ZERO {
            let message = format!(
                "{} position lost {} {} of value: {} -> {}",
                pool.pair_name(),
                (-delta).round_dp(6).normalize(),
                pool.token_b.symbol,
                entry.total_value.round_dp(6).normalize(),
                exit.total_value.round_dp(6).normalize()
            );
            warn!(%delta, "Position closed at a loss");
            self.journal.alert(AlertLevel::Loss, &message).await;
        } else {
            info!(%delta, "Position closed without loss");
        }
    }
}

fn amounts(pool: &PoolDetails, (amount_a, amount_b): (Decimal, Decimal)) -> AmountsData {
    AmountsData {
        symbol_a: pool.token_a.symbol.clone(),
        symbol_b: pool.token_b.symbol.clone(),
        amount_a,
        amount_b,
    }
}
