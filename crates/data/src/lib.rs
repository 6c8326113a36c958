//! Persistence for the DLMM liquidity agent.
//!
//! This crate provides the append-only action and balance log the
//! rebalancing engine reports to:
//! - [`ActionLog`]: the contract the engine depends on
//! - [`FileActionLog`]: plain-text action lines plus a JSON-lines balance history
//! - [`MemoryActionLog`]: in-process log for dry runs and tests
//! - [`repositories`]: PostgreSQL-backed storage via `sqlx`

/// Action log contract and local implementations.
pub mod action_log;
/// Repository implementations for database persistence.
pub mod repositories;

pub use action_log::{ActionLog, FileActionLog, MemoryActionLog};
pub use repositories::{Database, PgActionLog};
