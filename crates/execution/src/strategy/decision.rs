//! Per-cycle rebalance decision.

use crate::alerts::AlertLevel;
use crate::error::EngineError;
use crate::lifecycle::{PositionController, PositionState};
use crate::retry::{RetryPolicy, retry};
use dlmm_lp_domain::LedgerError;
use dlmm_lp_protocols::LiquidityProvider;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Decides each cycle whether the position must move.
pub struct RebalanceLoop {
    controller: PositionController,
    liquidity: Arc<dyn LiquidityProvider>,
    retry: RetryPolicy,
}

impl RebalanceLoop {
    pub fn new(
        controller: PositionController,
        liquidity: Arc<dyn LiquidityProvider>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            controller,
            liquidity,
            retry,
        }
    }

    pub fn controller(&self) -> &PositionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PositionController {
        &mut self.controller
    }

    /// Runs one decision cycle and returns whether the position changed.
    ///
    /// Never fails: a ledger that reports no position triggers a
    /// re-synchronization, any other error is alerted and the cycle ends.
    pub async fn evaluate(&mut self) -> bool {
        match self.step().await {
            Ok(changed) => changed,
            Err(e) if e.is_no_position() => {
                warn!(error = %e, "Ledger reports no position, re-synchronizing");
                self.controller
                    .journal()
                    .note("Position missing on ledger, re-synchronizing")
                    .await;
                match self.controller.load_initial_state().await {
                    Ok(created) => created,
                    Err(e) => {
                        self.report_failure(&e).await;
                        false
                    }
                }
            }
            Err(e) => {
                self.report_failure(&e).await;
                false
            }
        }
    }

    async fn step(&mut self) -> Result<bool, EngineError> {
        let PositionState::HasPosition(range) = self.controller.state() else {
            return self.controller.load_initial_state().await;
        };

        let pool = self.controller.config().pool_address.clone();
        let positions = retry(self.retry, "get positions", || {
            self.liquidity.get_positions(&pool)
        })
        .await?;
        if positions.is_empty() {
            return Err(LedgerError::NoPositionFound(format!(
                "tracked position {range} is no longer listed in pool {pool}"
            ))
            .into());
        }

        let active = retry(self.retry, "get active bin", || {
            self.liquidity.get_active_bin(&pool)
        })
        .await?;

        if range.contains(active.bin_id) {
            debug!(active_bin = active.bin_id, range = %range, "Active bin inside range");
            return Ok(false);
        }

        info!(active_bin = active.bin_id, range = %range, "Active bin left range, relocating");
        self.controller
            .journal()
            .note(&format!(
                "Active bin {} is outside position range {}, relocating",
                active.bin_id, range
            ))
            .await;
        self.controller.relocate().await?;
        Ok(true)
    }

    async fn report_failure(&self, err: &EngineError) {
        let level = if err.is_bad_request() {
            AlertLevel::Warning
        } else {
            AlertLevel::Error
        };
        error!(error = %err, "Rebalance cycle failed");
        self.controller
            .journal()
            .alert(level, &format!("Rebalance cycle failed: {err}"))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use dlmm_lp_domain::entities::PositionRange;
    use rust_decimal_macros::dec;

    async fn adopted(harness: &Harness) -> RebalanceLoop {
        harness.ledger.add_position(PositionRange::new(100, 120));
        let mut decision = harness.decision_loop();
        decision
            .controller_mut()
            .load_initial_state()
            .await
            .unwrap();
        decision
    }

    #[tokio::test]
    async fn test_in_range_keeps_position() {
        let harness = Harness::new();
        let mut decision = adopted(&harness).await;
        harness.ledger.set_active_bin(110, dec!(100));

        assert!(!decision.evaluate().await);
        assert_eq!(harness.ledger.remove_calls(), 0);
        assert_eq!(harness.ledger.add_calls(), 0);
        assert_eq!(
            decision.controller().state(),
            PositionState::HasPosition(PositionRange::new(100, 120))
        );
    }

    #[tokio::test]
    async fn test_range_bounds_are_inclusive() {
        let harness = Harness::new();
        let mut decision = adopted(&harness).await;

        harness.ledger.set_active_bin(100, dec!(100));
        assert!(!decision.evaluate().await);
        harness.ledger.set_active_bin(120, dec!(100));
        assert!(!decision.evaluate().await);
        assert_eq!(harness.ledger.remove_calls(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_relocates_once() {
        let harness = Harness::new();
        let mut decision = adopted(&harness).await;
        harness
            .ledger
            .set_removal(dec!(5), dec!(500), dec!(0), dec!(2));
        harness.ledger.set_active_bin(130, dec!(100));

        assert!(decision.evaluate().await);

        assert_eq!(harness.ledger.remove_calls(), 1);
        assert_eq!(harness.ledger.add_calls(), 1);
        assert_eq!(
            decision.controller().state(),
            PositionState::HasPosition(PositionRange::new(110, 150))
        );
        let lines = harness.action_log.lines().await;
        assert!(
            lines
                .iter()
                .any(|l| l == "Active bin 130 is outside position range [100, 120], relocating")
        );

        // The new range contains the active bin, so the next cycle is idle.
        assert!(!decision.evaluate().await);
        assert_eq!(harness.ledger.remove_calls(), 1);
    }

    #[tokio::test]
    async fn test_below_range_relocates_once() {
        let harness = Harness::new();
        let mut decision = adopted(&harness).await;
        harness
            .ledger
            .set_removal(dec!(5), dec!(500), dec!(0), dec!(0));
        harness.ledger.set_active_bin(90, dec!(100));

        assert!(decision.evaluate().await);
        assert_eq!(harness.ledger.remove_calls(), 1);
        assert_eq!(harness.ledger.add_calls(), 1);
        assert_eq!(
            decision.controller().state(),
            PositionState::HasPosition(PositionRange::new(70, 110))
        );

        assert!(!decision.evaluate().await);
        assert_eq!(harness.ledger.remove_calls(), 1);
    }

    #[tokio::test]
    async fn test_creates_position_when_untracked() {
        let harness = Harness::new();
        harness.ledger.set_native(dec!(3));
        let mut decision = harness.decision_loop();

        assert!(decision.evaluate().await);
        assert_eq!(harness.ledger.add_calls(), 1);
        assert!(decision.controller().state().range().is_some());
    }

    #[tokio::test]
    async fn test_reloads_when_ledger_lost_position() {
        let harness = Harness::new();
        harness.ledger.set_native(dec!(3));
        let mut decision = adopted(&harness).await;

        // Position closed outside the agent.
        harness.ledger.clear_positions();
        harness.ledger.set_active_bin(200, dec!(100));

        assert!(decision.evaluate().await);
        assert_eq!(harness.ledger.add_calls(), 1);
        assert_eq!(
            decision.controller().state(),
            PositionState::HasPosition(PositionRange::new(180, 220))
        );
        let lines = harness.action_log.lines().await;
        assert!(
            lines
                .iter()
                .any(|l| l == "Position missing on ledger, re-synchronizing")
        );
    }

    #[tokio::test]
    async fn test_reloads_when_position_closed_while_in_range() {
        let harness = Harness::new();
        harness.ledger.set_native(dec!(3));
        let mut decision = adopted(&harness).await;

        harness.ledger.clear_positions();
        harness.ledger.set_active_bin(110, dec!(100));

        assert!(decision.evaluate().await);
        assert_eq!(harness.ledger.remove_calls(), 0);
        assert_eq!(harness.ledger.add_calls(), 1);
        assert_eq!(
            decision.controller().state(),
            PositionState::HasPosition(PositionRange::new(90, 130))
        );

        assert!(!decision.evaluate().await);
        assert_eq!(harness.ledger.add_calls(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_alerted_not_raised() {
        let harness = Harness::new();
        let mut decision = adopted(&harness).await;
        harness
            .ledger
            .fail_active_bin_with(LedgerError::Transient("timeout".into()), 100);

        assert!(!decision.evaluate().await);
        assert!(harness.notifier.has(AlertLevel::Error));
        assert_eq!(
            decision.controller().state(),
            PositionState::HasPosition(PositionRange::new(100, 120))
        );
    }

    #[tokio::test]
    async fn test_bad_request_is_a_warning() {
        let harness = Harness::new();
        let mut decision = adopted(&harness).await;
        harness
            .ledger
            .fail_active_bin_with(LedgerError::BadRequest("invalid pool".into()), 100);

        assert!(!decision.evaluate().await);
        assert!(harness.notifier.has(AlertLevel::Warning));
        assert!(!harness.notifier.has(AlertLevel::Error));
    }
}
