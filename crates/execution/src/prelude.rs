//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use dlmm_lp_execution::prelude::*;
//! ```

// Alerts
pub use crate::alerts::{
    Alert, AlertLevel, ConsoleNotifier, MultiNotifier, Notifier, TelegramNotifier,
};

// Configuration
pub use crate::config::{EngineConfig, EngineTiming};
pub use crate::context::Collaborators;
pub use crate::error::EngineError;

// Lifecycle
pub use crate::lifecycle::{
    AggregateStats, AmountsData, EventData, Journal, LifecycleEvent, LifecycleEventType,
    LifecycleTracker, PositionController, PositionOpenedData, PositionState, RelocationData,
    SwapData,
};

// Pool
pub use crate::pool::{BalanceAccessor, PoolResolver};

// Retry
pub use crate::retry::{RetryPolicy, poll_until, retry, wait_for_positions};

// Scheduler
pub use crate::scheduler::{AgentScheduler, PerformanceReport};

// Strategy
pub use crate::strategy::{AssetBalancer, BalancerConfig, RebalanceLoop, SwapOutcome};
