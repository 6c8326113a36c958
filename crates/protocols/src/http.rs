//! Classification of HTTP failures into ledger error kinds.

use dlmm_lp_domain::LedgerError;
use reqwest::StatusCode;

/// Maps a non-success response to an error kind.
pub fn classify_status(status: StatusCode, body: &str) -> LedgerError {
    let message = format!("{status}: {body}");
    if body.to_ascii_lowercase().contains("insufficient") {
        return LedgerError::InsufficientFunds(message);
    }
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        LedgerError::Transient(message)
    } else if status.is_client_error() {
        LedgerError::BadRequest(message)
    } else {
        LedgerError::Other(message)
    }
}

/// Maps a transport-level failure to an error kind.
pub fn classify_reqwest_error(err: &reqwest::Error) -> LedgerError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        LedgerError::Transient(err.to_string())
    } else if let Some(status) = err.status() {
        classify_status(status, &err.to_string())
    } else {
        LedgerError::Other(err.to_string())
    }
}
