//! Agent run loop.
//!
//! Drives the rebalance decision on a fixed cadence and layers the periodic
//! duties on top of it:
//! - Low native balance warnings
//! - Performance reports from the balance history
//! - Graceful shutdown between cycles

mod report;

pub use report::PerformanceReport;

use crate::alerts::AlertLevel;
use crate::config::{EngineConfig, EngineTiming};
use crate::error::EngineError;
use crate::strategy::RebalanceLoop;
use chrono::Utc;
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

/// Runs the decision loop until shutdown.
pub struct AgentScheduler {
    decision: RebalanceLoop,
    poll_interval: Duration,
    report_interval: Option<Duration>,
    min_native_balance: Decimal,
    low_balance_alerted: bool,
    next_report_at: Option<Instant>,
    cycles: u64,
}

impl AgentScheduler {
    pub fn new(decision: RebalanceLoop, config: &EngineConfig, timing: &EngineTiming) -> Self {
        Self {
            decision,
            poll_interval: timing.poll_interval,
            report_interval: config.report_interval,
            min_native_balance: config.min_native_balance,
            low_balance_alerted: false,
            next_report_at: None,
            cycles: 0,
        }
    }

    pub fn decision(&self) -> &RebalanceLoop {
        &self.decision
    }

    /// Completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Synchronizes with the ledger. Failures here are fatal to the agent.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        let created = match self.decision.controller_mut().load_initial_state().await {
            Ok(created) => created,
            Err(e) => {
                error!(error = %e, "Agent failed to start");
                // The controller alerts its own fee-reserve failure.
                if !matches!(e, EngineError::InsufficientFundsForPositionFees { .. }) {
                    self.decision
                        .controller()
                        .journal()
                        .alert(AlertLevel::Error, &format!("Agent failed to start: {e}"))
                        .await;
                }
                return Err(e);
            }
        };
        let state = self.decision.controller().state();
        info!(created, state = ?state, "Agent started");
        Ok(())
    }

    /// Runs one cycle: decision, balance check, report when due.
    pub async fn run_cycle(&mut self) -> bool {
        let changed = self.decision.evaluate().await;
        self.check_native_balance().await;
        self.maybe_report().await;
        self.cycles += 1;
        debug!(cycle = self.cycles, changed, "Cycle complete");
        changed
    }

    /// Starts the agent and cycles until `shutdown` resolves.
    ///
    /// Shutdown is observed between cycles only, so an in-flight
    /// relocation always completes.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), EngineError>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        tokio::pin!(shutdown);

        loop {
            self.run_cycle().await;
            tokio::select! {
                () = &mut shutdown => {
                    info!(cycles = self.cycles, "Shutdown requested, stopping agent");
                    break;
                }
                () = sleep(self.poll_interval) => {}
            }
        }
        Ok(())
    }

    /// Warns once each time the raw native balance drops below the minimum.
    async fn check_native_balance(&mut self) {
        let controller = self.decision.controller();
        match controller.balances().native_balance().await {
            Ok(balance) if balance < self.min_native_balance => {
                if !self.low_balance_alerted {
                    let message = format!(
                        "Native balance {} is below the minimum of {} needed for fees",
                        balance.normalize(),
                        self.min_native_balance.normalize()
                    );
                    warn!(%balance, minimum = %self.min_native_balance, "Low native balance");
                    controller
                        .journal()
                        .alert(AlertLevel::Warning, &message)
                        .await;
                    self.low_balance_alerted = true;
                }
            }
            Ok(_) => self.low_balance_alerted = false,
            Err(e) => warn!(error = %e, "Failed to read native balance"),
        }
    }

    async fn maybe_report(&mut self) {
        let Some(interval) = self.report_interval else {
            return;
        };
        let now = Instant::now();
        match self.next_report_at {
            None => {
                self.next_report_at = Some(now + interval);
                return;
            }
            Some(at) if now < at => return,
            Some(_) => self.next_report_at = Some(now + interval),
        }
        self.send_performance_report(interval).await;
    }

    /// Compares the latest balance snapshot with the one from `interval` ago.
    pub async fn send_performance_report(&self, interval: Duration) {
        let journal = self.decision.controller().journal();
        let Ok(lookback) = chrono::Duration::from_std(interval) else {
            warn!(?interval, "Report interval out of range");
            return;
        };
        let now = Utc::now();

        let current = journal.action_log().latest_balance_before(now).await;
        let previous = journal
            .action_log()
            .latest_balance_before(now - lookback)
            .await;

        let (to, from) = match (current, previous) {
            (Ok(Some(to)), Ok(Some(from))) => (to, from),
            (Ok(_), Ok(_)) => {
                info!("Not enough balance history for a performance report");
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to read balance history");
                return;
            }
        };

        let stats = journal.tracker().get_aggregate_stats().await;
        let report = PerformanceReport::new(from, to, stats);
        info!(change = %report.change(), "Sending performance report");
        journal
            .alert(AlertLevel::PerformanceReport, &report.to_string())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use chrono::Duration as ChronoDuration;
    use dlmm_lp_data::ActionLog;
    use dlmm_lp_domain::entities::PositionRange;
    use dlmm_lp_domain::value_objects::BalanceSnapshot;
    use rust_decimal_macros::dec;

    fn snapshot(hours_ago: i64, total: Decimal) -> BalanceSnapshot {
        BalanceSnapshot {
            recorded_at: Utc::now() - ChronoDuration::hours(hours_ago),
            symbol_a: "SOL".to_string(),
            symbol_b: "USDC".to_string(),
            amount_a: Decimal::ZERO,
            amount_b: total,
            price: dec!(100),
            total_value: total,
        }
    }

    #[tokio::test]
    async fn test_start_failure_is_fatal() {
        let harness = Harness::new();
        harness.ledger.set_pool_name("bad");
        let scheduler = harness.scheduler();

        let result = scheduler.run(std::future::ready(())).await;
        assert!(matches!(result, Err(EngineError::MalformedPoolMetadata(_))));
        let errors = harness.notifier.messages(AlertLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Agent failed to start: malformed pool metadata"));
    }

    #[tokio::test]
    async fn test_fee_reserve_failure_alerts_once() {
        let harness = Harness::new();
        harness.ledger.set_native(dec!(0.05));
        let mut scheduler = harness.scheduler();

        let result = scheduler.start().await;
        assert!(matches!(
            result,
            Err(EngineError::InsufficientFundsForPositionFees { .. })
        ));
        assert_eq!(harness.notifier.count(AlertLevel::Error), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let harness = Harness::new();
        harness.ledger.add_position(PositionRange::new(100, 120));
        let scheduler = harness.scheduler();

        let result = scheduler.run(std::future::ready(())).await;

        assert!(result.is_ok());
        assert_eq!(harness.ledger.remove_calls(), 0);
    }

    #[tokio::test]
    async fn test_low_balance_warns_once() {
        let harness = Harness::new();
        harness.ledger.add_position(PositionRange::new(100, 120));
        harness.ledger.set_native(dec!(0.01));
        let mut scheduler = harness.scheduler();
        scheduler.start().await.unwrap();

        scheduler.run_cycle().await;
        scheduler.run_cycle().await;
        assert_eq!(harness.notifier.count(AlertLevel::Warning), 1);

        harness.ledger.set_native(dec!(1));
        scheduler.run_cycle().await;
        harness.ledger.set_native(dec!(0.02));
        scheduler.run_cycle().await;
        assert_eq!(harness.notifier.count(AlertLevel::Warning), 2);
        assert_eq!(scheduler.cycles(), 4);
    }

    #[tokio::test]
    async fn test_performance_report_compares_history() {
        let harness = Harness::new();
        harness.ledger.add_position(PositionRange::new(100, 120));
        harness
            .action_log
            .record_balance(&snapshot(30, dec!(1000)))
            .await
            .unwrap();
        harness
            .action_log
            .record_balance(&snapshot(1, dec!(1100)))
            .await
            .unwrap();
        let mut scheduler = harness.scheduler();
        scheduler.start().await.unwrap();

        scheduler
            .send_performance_report(Duration::from_secs(24 * 3600))
            .await;

        let reports = harness.notifier.messages(AlertLevel::PerformanceReport);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].starts_with("Value 1000 -> 1100 USDC (+10%)"));
    }

    #[tokio::test]
    async fn test_performance_report_needs_history() {
        let harness = Harness::new();
        harness
            .action_log
            .record_balance(&snapshot(1, dec!(1100)))
            .await
            .unwrap();
        let scheduler = harness.scheduler();

        scheduler
            .send_performance_report(Duration::from_secs(24 * 3600))
            .await;
        assert_eq!(harness.notifier.count(AlertLevel::PerformanceReport), 0);
    }

    #[tokio::test]
    async fn test_report_waits_for_first_interval() {
        let harness = Harness::new();
        harness.ledger.add_position(PositionRange::new(100, 120));
        harness
            .action_log
            .record_balance(&snapshot(30, dec!(1000)))
            .await
            .unwrap();
        harness
            .action_log
            .record_balance(&snapshot(1, dec!(1100)))
            .await
            .unwrap();
        let mut scheduler = harness.scheduler();
        scheduler.start().await.unwrap();

        scheduler.run_cycle().await;
        assert_eq!(harness.notifier.count(AlertLevel::PerformanceReport), 0);
    }
}
