//! Error taxonomy shared by the collaborators and the engine.

use rust_decimal::Decimal;
use thiserror::Error;

/// Failure reported by any ledger-facing collaborator.
///
/// Collaborators classify their raw transport failures into one of these
/// kinds once, at their own boundary. The engine only ever dispatches on the
/// kind and never inspects message text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The wallet cannot cover the requested amount or the transaction fee.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    /// The ledger holds no position where one was expected.
    #[error("no position found: {0}")]
    NoPositionFound(String),
    /// Temporary unavailability (timeouts, rate limits, node lag).
    #[error("transient failure: {0}")]
    Transient(String),
    /// The request was rejected as malformed by the remote service.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl LedgerError {
    /// Returns true when retrying cannot succeed because funds are missing.
    #[must_use]
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, Self::InsufficientFunds(_))
    }

    /// Returns true when the ledger disagrees about a position existing.
    #[must_use]
    pub fn is_no_position(&self) -> bool {
        matches!(self, Self::NoPositionFound(_))
    }

    /// Returns true for a rejected request.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }

    /// Returns false for kinds another attempt cannot change: missing funds
    /// and a position the ledger no longer holds.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InsufficientFunds(_) | Self::NoPositionFound(_))
    }
}

/// Invalid input to the bin or balance math.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MathError {
    /// Range fraction must be strictly positive.
    #[error("range fraction must be positive, got {0}")]
    NonPositiveFraction(Decimal),
    /// Bin step must be non-zero.
    #[error("bin step must be non-zero")]
    ZeroBinStep,
    /// Prices must be strictly positive.
    #[error("price must be positive, got {0}")]
    NonPositivePrice(Decimal),
    /// Balances must not be negative.
    #[error("balance must not be negative, got {0}")]
    NegativeBalance(Decimal),
    /// Conversion between numeric representations overflowed.
    #[error("numeric overflow: {0}")]
    Overflow(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(LedgerError::InsufficientFunds("x".into()).is_insufficient_funds());
        assert!(!LedgerError::Transient("x".into()).is_insufficient_funds());
        assert!(LedgerError::NoPositionFound("x".into()).is_no_position());
        assert!(LedgerError::BadRequest("x".into()).is_bad_request());
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(LedgerError::Transient("x".into()).is_retryable());
        assert!(LedgerError::BadRequest("x".into()).is_retryable());
        assert!(LedgerError::Other("x".into()).is_retryable());
        assert!(!LedgerError::InsufficientFunds("x".into()).is_retryable());
        assert!(!LedgerError::NoPositionFound("x".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = LedgerError::Transient("node lagging".into());
        assert_eq!(err.to_string(), "transient failure: node lagging");
    }
}
