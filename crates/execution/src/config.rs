//! Engine configuration and timing.

use crate::retry::RetryPolicy;
use rust_decimal::Decimal;
use std::time::Duration;

/// Operator-facing parameters of the rebalancing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// DLMM pool address.
    pub pool_address: String,
    /// Relative half-width of the position range, e.g. `0.05` for ±5%.
    pub range_fraction: Decimal,
    /// Native amount held back from every usable balance for fees.
    pub fee_buffer: Decimal,
    /// Native balance required before a position is created.
    pub min_native_balance: Decimal,
    /// Excess value, as a fraction of total value, below which no swap is made.
    pub swap_tolerance: Decimal,
    /// Cadence of performance reports. `None` disables them.
    pub report_interval: Option<Duration>,
}

impl EngineConfig {
    /// Creates a configuration with default parameters for `pool_address`.
    pub fn new(pool_address: impl Into<String>) -> Self {
        Self {
            pool_address: pool_address.into(),
            range_fraction: Decimal::new(5, 2),
            fee_buffer: Decimal::new(1, 1),
            min_native_balance: Decimal::new(6, 2),
            swap_tolerance: Decimal::new(5, 3),
            report_interval: Some(Duration::from_secs(24 * 3600)),
        }
    }
}

/// Every delay the engine waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    /// Policy for collaborator calls.
    pub retry: RetryPolicy,
    /// Wait after a swap or withdrawal before balances are read again.
    pub settle_delay: Duration,
    /// Delay between the end of one decision cycle and the start of the next.
    pub poll_interval: Duration,
    /// Position lookup at startup.
    pub startup_lookup: RetryPolicy,
    /// Position lookup after creating a position.
    pub confirmation: RetryPolicy,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            settle_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(10),
            startup_lookup: RetryPolicy::new(3, Duration::from_secs(5)),
            confirmation: RetryPolicy::new(10, Duration::from_secs(10)),
        }
    }
}

impl EngineTiming {
    /// Same attempt budgets with every delay set to zero.
    #[must_use]
    pub fn without_delays() -> Self {
        let timing = Self::default();
        Self {
            retry: timing.retry.with_delay(Duration::ZERO),
            settle_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            startup_lookup: timing.startup_lookup.with_delay(Duration::ZERO),
            confirmation: timing.confirmation.with_delay(Duration::ZERO),
        }
    }

    /// Overrides the inter-cycle delay.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
