//! Fan-out of engine activity to the tracker, the action log and alerts.

use super::{LifecycleEvent, LifecycleTracker};
use crate::alerts::{AlertLevel, Notifier};
use dlmm_lp_data::ActionLog;
use dlmm_lp_domain::value_objects::BalanceSnapshot;
use std::sync::Arc;
use tracing::warn;

/// Reporting sinks shared by the engine components.
///
/// Every method is fire-and-forget: sink failures are logged and dropped so
/// they never alter control flow.
#[derive(Clone)]
pub struct Journal {
    tracker: Arc<LifecycleTracker>,
    action_log: Arc<dyn ActionLog>,
    notifier: Arc<dyn Notifier>,
}

impl Journal {
    pub fn new(
        tracker: Arc<LifecycleTracker>,
        action_log: Arc<dyn ActionLog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            tracker,
            action_log,
            notifier,
        }
    }

    /// Tracks `event` and appends its line to the action log.
    pub async fn record(&self, event: LifecycleEvent) {
        let line = event.to_string();
        self.tracker.record(event).await;
        self.note(&line).await;
    }

    /// Appends a free-form line to the action log.
    pub async fn note(&self, line: &str) {
        if let Err(e) = self.action_log.append(line).await {
            warn!(error = %e, "Failed to append to action log");
        }
    }

    /// Stores a balance snapshot.
    pub async fn snapshot(&self, snapshot: &BalanceSnapshot) {
        if let Err(e) = self.action_log.record_balance(snapshot).await {
            warn!(error = %e, "Failed to record balance snapshot");
        }
    }

    /// Sends an alert.
    pub async fn alert(&self, level: AlertLevel, message: &str) {
        self.notifier.send(level, message).await;
    }

    pub fn tracker(&self) -> &Arc<LifecycleTracker> {
        &self.tracker
    }

    pub fn action_log(&self) -> &Arc<dyn ActionLog> {
        &self.action_log
    }
}
