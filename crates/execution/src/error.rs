//! Engine error type.

use dlmm_lp_domain::{LedgerError, MathError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures surfaced by the rebalancing engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A collaborator call failed after classification and retries.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The pool's market identifier is not of the form `SYMBOL_A-SYMBOL_B`.
    #[error("malformed pool metadata: {0}")]
    MalformedPoolMetadata(String),

    /// The pool metadata lacks one of the token mints.
    #[error("pool metadata is missing a token identity")]
    MissingTokenIdentity,

    /// Native balance is below what opening a position costs.
    #[error(
        "insufficient native balance for position fees: required {required}, available {available}"
    )]
    InsufficientFundsForPositionFees {
        required: Decimal,
        available: Decimal,
    },

    /// A relocation was requested without a tracked position.
    #[error("no active position to relocate")]
    NoActivePosition,

    /// A newly created position never showed up in the ledger.
    #[error("created position did not become visible")]
    PositionNotVisible,

    #[error(transparent)]
    Math(#[from] MathError),
}

impl EngineError {
    /// True when the ledger disagrees with the tracked position state.
    pub fn is_no_position(&self) -> bool {
        matches!(self, Self::Ledger(e) if e.is_no_position())
    }

    /// True for funding shortfalls that more attempts cannot fix.
    pub fn is_insufficient_funds(&self) -> bool {
        match self {
            Self::InsufficientFundsForPositionFees { .. } => true,
            Self::Ledger(e) => e.is_insufficient_funds(),
            _ => false,
        }
    }

    /// True for rejected requests that are expected to clear on a later cycle.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::Ledger(e) if e.is_bad_request())
    }
}
