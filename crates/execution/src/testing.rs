//! In-memory ledger and wiring shared by the engine tests.

use crate::alerts::{Alert, AlertLevel, Notifier};
use crate::config::{EngineConfig, EngineTiming};
use crate::context::Collaborators;
use crate::lifecycle::{Journal, LifecycleTracker, PositionController};
use crate::scheduler::AgentScheduler;
use crate::strategy::{AssetBalancer, BalancerConfig, RebalanceLoop};
use async_trait::async_trait;
use dlmm_lp_data::MemoryActionLog;
use dlmm_lp_domain::LedgerError;
use dlmm_lp_domain::constants::WRAPPED_NATIVE_MINT;
use dlmm_lp_domain::entities::{PoolDetails, PositionInfo, PositionRange, TokenInfo};
use dlmm_lp_domain::value_objects::ActiveBin;
use dlmm_lp_protocols::{
    LiquidityProvider, PoolMetadata, PoolMetadataSource, RemovalOutcome, SwapProvider,
    WalletProvider,
};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

pub(crate) const POOL: &str = "5rCf1DM8LjKTw4YqhnoLcngyZYeNnQqztScTogYHAS6";
pub(crate) const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

pub(crate) fn sol_usdc_pool() -> PoolDetails {
    PoolDetails::new(
        POOL,
        25,
        TokenInfo::new(WRAPPED_NATIVE_MINT, "SOL"),
        TokenInfo::new(USDC_MINT, "USDC"),
    )
}

/// A scripted failure returned for the next `remaining` calls.
struct Failure {
    error: LedgerError,
    remaining: usize,
}

fn take_failure(slot: &mut Option<Failure>) -> Option<LedgerError> {
    let failure = slot.as_mut()?;
    if failure.remaining == 0 {
        *slot = None;
        return None;
    }
    failure.remaining -= 1;
    Some(failure.error.clone())
}

struct LedgerState {
    metadata: PoolMetadata,
    native: Decimal,
    token_b: Decimal,
    active_bin: ActiveBin,
    positions: Vec<PositionInfo>,
    created: u32,
    hide_created: bool,
    removal: RemovalOutcome,
    swap_output: Option<Decimal>,
    swaps: Vec<(String, String, Decimal)>,
    deposits: Vec<(Decimal, Decimal, u32)>,
    swap_failure: Option<Failure>,
    removal_failure: Option<Failure>,
    active_bin_failure: Option<Failure>,
    swap_attempts: u32,
    add_calls: u32,
    remove_calls: u32,
    position_queries: u32,
}

/// Single-wallet, single-pool ledger.
///
/// Asset A is the native token, asset B is USDC. Swaps fill at the active
/// bin price unless an output is scripted.
pub(crate) struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                metadata: PoolMetadata {
                    bin_step: 25,
                    mint_x: WRAPPED_NATIVE_MINT.to_string(),
                    mint_y: USDC_MINT.to_string(),
                    name: "SOL-USDC".to_string(),
                },
                native: Decimal::ZERO,
                token_b: Decimal::ZERO,
                active_bin: ActiveBin::new(110, Decimal::ONE_HUNDRED),
                positions: Vec::new(),
                created: 0,
                hide_created: false,
                removal: RemovalOutcome::default(),
                swap_output: None,
                swaps: Vec::new(),
                deposits: Vec::new(),
                swap_failure: None,
                removal_failure: None,
                active_bin_failure: None,
                swap_attempts: 0,
                add_calls: 0,
                remove_calls: 0,
                position_queries: 0,
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LedgerState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn set_pool_name(&self, name: &str) {
        self.with_state(|s| s.metadata.name = name.to_string());
    }

    pub fn set_bin_step(&self, bin_step: u16) {
        self.with_state(|s| s.metadata.bin_step = bin_step);
    }

    pub fn set_native(&self, amount: Decimal) {
        self.with_state(|s| s.native = amount);
    }

    pub fn set_active_bin(&self, bin_id: i32, price: Decimal) {
        self.with_state(|s| s.active_bin = ActiveBin::new(bin_id, price));
    }

    pub fn add_position(&self, range: PositionRange) {
        self.with_state(|s| {
            let address = format!("existing-{}", s.positions.len());
            s.positions.push(PositionInfo { address, range });
        });
    }

    pub fn clear_positions(&self) {
        self.with_state(|s| s.positions.clear());
    }

    /// New positions are accepted but never listed.
    pub fn hide_created_positions(&self) {
        self.with_state(|s| s.hide_created = true);
    }

    /// Amounts credited by the next withdrawals.
    pub fn set_removal(
        &self,
        removed_a: Decimal,
        removed_b: Decimal,
        fees_a: Decimal,
        fees_b: Decimal,
    ) {
        self.with_state(|s| {
            s.removal = RemovalOutcome {
                liquidity_removed: (removed_a, removed_b),
                fees_claimed: (fees_a, fees_b),
            }
        });
    }

    pub fn set_swap_output(&self, amount: Decimal) {
        self.with_state(|s| s.swap_output = Some(amount));
    }

    pub fn fail_swaps_with(&self, error: LedgerError, times: usize) {
        self.with_state(|s| s.swap_failure = Some(Failure { error, remaining: times }));
    }

    pub fn fail_removals_with(&self, error: LedgerError, times: usize) {
        self.with_state(|s| s.removal_failure = Some(Failure { error, remaining: times }));
    }

    pub fn fail_active_bin_with(&self, error: LedgerError, times: usize) {
        self.with_state(|s| s.active_bin_failure = Some(Failure { error, remaining: times }));
    }

    /// Completed swaps as `(input mint, output mint, amount in)`.
    pub fn swaps(&self) -> Vec<(String, String, Decimal)> {
        self.with_state(|s| s.swaps.clone())
    }

    /// Deposits as `(amount A, amount B, range width)`.
    pub fn deposits(&self) -> Vec<(Decimal, Decimal, u32)> {
        self.with_state(|s| s.deposits.clone())
    }

    pub fn swap_attempts(&self) -> u32 {
        self.with_state(|s| s.swap_attempts)
    }

    pub fn add_calls(&self) -> u32 {
        self.with_state(|s| s.add_calls)
    }

    pub fn remove_calls(&self) -> u32 {
        self.with_state(|s| s.remove_calls)
    }

    pub fn position_queries(&self) -> u32 {
        self.with_state(|s| s.position_queries)
    }
}

#[async_trait]
impl PoolMetadataSource for MockLedger {
    async fn fetch_pool_metadata(&self, _pool_address: &str) -> Result<PoolMetadata, LedgerError> {
        Ok(self.with_state(|s| s.metadata.clone()))
    }
}

#[async_trait]
impl WalletProvider for MockLedger {
    async fn get_balance(&self, mint: Option<&str>) -> Result<Decimal, LedgerError> {
        Ok(self.with_state(|s| match mint {
            None | Some(WRAPPED_NATIVE_MINT) => s.native,
            Some(mint) if mint == s.metadata.mint_y => s.token_b,
            Some(_) => Decimal::ZERO,
        }))
    }
}

#[async_trait]
impl SwapProvider for MockLedger {
    async fn swap(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        self.with_state(|s| {
            s.swap_attempts += 1;
            if let Some(error) = take_failure(&mut s.swap_failure) {
                return Err(error);
            }
            let price = s.active_bin.price_per_unit;
            let out = if input_mint == WRAPPED_NATIVE_MINT {
                let out = s.swap_output.unwrap_or(amount * price);
                s.native = (s.native - amount).max(Decimal::ZERO);
                s.token_b += out;
                out
            } else {
                let out = s.swap_output.unwrap_or(amount / price);
                s.token_b = (s.token_b - amount).max(Decimal::ZERO);
                s.native += out;
                out
            };
            s.swaps
                .push((input_mint.to_string(), output_mint.to_string(), amount));
            Ok(out)
        })
    }
}

#[async_trait]
impl LiquidityProvider for MockLedger {
    async fn get_positions(&self, _pool_address: &str) -> Result<Vec<PositionInfo>, LedgerError> {
        Ok(self.with_state(|s| {
            s.position_queries += 1;
            s.positions.clone()
        }))
    }

    async fn get_active_bin(&self, _pool_address: &str) -> Result<ActiveBin, LedgerError> {
        self.with_state(|s| match take_failure(&mut s.active_bin_failure) {
            Some(error) => Err(error),
            None => Ok(s.active_bin.clone()),
        })
    }

    async fn add_liquidity(
        &self,
        _pool_address: &str,
        amount_a: Decimal,
        amount_b: Decimal,
        range_width: u32,
    ) -> Result<(), LedgerError> {
        self.with_state(|s| {
            s.add_calls += 1;
            s.deposits.push((amount_a, amount_b, range_width));
            s.native = (s.native - amount_a).max(Decimal::ZERO);
            s.token_b = (s.token_b - amount_b).max(Decimal::ZERO);
            s.created += 1;
            if !s.hide_created {
                let address = format!("created-{}", s.created);
                let range = PositionRange::centered(s.active_bin.bin_id, range_width);
                s.positions.push(PositionInfo { address, range });
            }
            Ok(())
        })
    }

    async fn remove_liquidity(
        &self,
        pool_address: &str,
        _close_position: bool,
    ) -> Result<RemovalOutcome, LedgerError> {
        self.with_state(|s| {
            s.remove_calls += 1;
            if let Some(error) = take_failure(&mut s.removal_failure) {
                return Err(error);
            }
            if s.positions.is_empty() {
                return Err(LedgerError::NoPositionFound(format!(
                    "no positions found in pool {pool_address}"
                )));
            }
            s.positions.remove(0);
            let outcome = s.removal;
            s.native += outcome.liquidity_removed.0 + outcome.fees_claimed.0;
            s.token_b += outcome.liquidity_removed.1 + outcome.fees_claimed.1;
            Ok(outcome)
        })
    }
}

/// Keeps every alert it receives.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingNotifier {
    pub fn messages(&self, level: AlertLevel) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.level == level)
            .map(|a| a.message.clone())
            .collect()
    }

    pub fn count(&self, level: AlertLevel) -> usize {
        self.messages(level).len()
    }

    pub fn has(&self, level: AlertLevel) -> bool {
        self.count(level) > 0
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: &Alert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Engine components wired to one [`MockLedger`], with every delay zeroed.
pub(crate) struct Harness {
    pub ledger: Arc<MockLedger>,
    pub action_log: Arc<MemoryActionLog>,
    pub notifier: Arc<RecordingNotifier>,
    pub tracker: Arc<LifecycleTracker>,
    pub config: EngineConfig,
    pub timing: EngineTiming,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(MockLedger::new()),
            action_log: Arc::new(MemoryActionLog::new()),
            notifier: Arc::new(RecordingNotifier::default()),
            tracker: Arc::new(LifecycleTracker::new()),
            config: EngineConfig::new(POOL),
            timing: EngineTiming::without_delays(),
        }
    }

    pub fn with_range_fraction(mut self, fraction: Decimal) -> Self {
        self.config.range_fraction = fraction;
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            metadata: self.ledger.clone(),
            wallet: self.ledger.clone(),
            swaps: self.ledger.clone(),
            liquidity: self.ledger.clone(),
            action_log: self.action_log.clone(),
            notifier: self.notifier.clone(),
        }
    }

    pub fn journal(&self) -> Journal {
        Journal::new(
            self.tracker.clone(),
            self.action_log.clone(),
            self.notifier.clone(),
        )
    }

    pub fn balancer(&self) -> AssetBalancer {
        AssetBalancer::new(
            self.ledger.clone(),
            self.journal(),
            BalancerConfig {
                tolerance: self.config.swap_tolerance,
                retry: self.timing.retry,
                settle_delay: self.timing.settle_delay,
            },
        )
    }

    pub fn controller(&self) -> PositionController {
        PositionController::new(
            self.config.clone(),
            self.timing,
            &self.collaborators(),
            self.journal(),
        )
    }

    pub fn decision_loop(&self) -> RebalanceLoop {
        RebalanceLoop::new(self.controller(), self.ledger.clone(), self.timing.retry)
    }

    pub fn scheduler(&self) -> AgentScheduler {
        AgentScheduler::new(self.decision_loop(), &self.config, &self.timing)
    }
}
