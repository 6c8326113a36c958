//! Lifecycle tracker for position history.

use super::{EventData, LifecycleEvent, LifecycleEventType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Counters accumulated since the agent started.
#[derive(Debug, Clone)]
pub struct AggregateStats {
    /// When tracking began.
    pub started_at: DateTime<Utc>,
    /// Positions opened.
    pub positions_opened: u32,
    /// Relocations completed.
    pub relocations: u32,
    /// Swaps executed.
    pub swaps: u32,
    /// Fees claimed in asset A.
    pub fees_a: Decimal,
    /// Fees claimed in asset B.
    pub fees_b: Decimal,
}

impl Default for AggregateStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            positions_opened: 0,
            relocations: 0,
            swaps: 0,
            fees_a: Decimal::ZERO,
            fees_b: Decimal::ZERO,
        }
    }
}

/// Tracks lifecycle events for the managed pool.
pub struct LifecycleTracker {
    /// Events, oldest first.
    events: Arc<RwLock<Vec<LifecycleEvent>>>,
    /// Running counters.
    stats: Arc<RwLock<AggregateStats>>,
}

impl LifecycleTracker {
    /// Creates a new lifecycle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(AggregateStats::default())),
        }
    }

    /// Records an event and updates the counters.
    pub async fn record(&self, event: LifecycleEvent) {
        {
            let mut stats = self.stats.write().await;
            match &event.data {
                EventData::PositionOpened(data) => {
                    stats.positions_opened += 1;
                    info!(pool = %event.pool, range = %data.range, "Position opened");
                }
                EventData::LiquidityRemoved(data) => {
                    info!(
                        pool = %event.pool,
                        amount_a = %data.amount_a,
                        amount_b = %data.amount_b,
                        "Liquidity removed"
                    );
                }
                EventData::FeesClaimed(data) => {
                    stats.fees_a += data.amount_a;
                    stats.fees_b += data.amount_b;
                    info!(
                        pool = %event.pool,
                        fees_a = %data.amount_a,
                        fees_b = %data.amount_b,
                        "Fees claimed"
                    );
                }
                EventData::Swapped(data) => {
                    stats.swaps += 1;
                    info!(
                        input = %data.input_symbol,
                        output = %data.output_symbol,
                        amount_in = %data.amount_in,
                        amount_out = %data.amount_out,
                        "Swap executed"
                    );
                }
                EventData::Relocated(data) => {
                    stats.relocations += 1;
                    info!(
                        pool = %event.pool,
                        old_range = %data.old_range,
                        new_range = %data.new_range,
                        "Position relocated"
                    );
                }
            }
        }

        debug!(event_id = %event.id, event_type = ?event.event_type, "Recorded lifecycle event");
        self.events.write().await.push(event);
    }

    /// Gets all events, oldest first.
    pub async fn get_events(&self) -> Vec<LifecycleEvent> {
        self.events.read().await.clone()
    }

    /// Gets events of one type, oldest first.
    pub async fn get_events_of(&self, event_type: LifecycleEventType) -> Vec<LifecycleEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Gets aggregate statistics.
    pub async fn get_aggregate_stats(&self) -> AggregateStats {
        self.stats.read().await.clone()
    }
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}
