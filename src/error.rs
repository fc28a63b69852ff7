//! Error types for proxy checks.

use std::time::Duration;
use thiserror::Error;

/// Why a single candidate was rejected.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The proxied client could not be constructed.
    #[error("client error: {0}")]
    Client(reqwest::Error),

    /// Connect or response timeout expired.
    #[error("timed out")]
    Timeout,

    /// Dial, send or body read failed.
    #[error("request error: {0}")]
    Request(reqwest::Error),

    /// The liveness probe did not answer 200.
    #[error("HTTP status: {0}")]
    Status(reqwest::StatusCode),

    /// A probe endpoint returned a body that is not the expected JSON.
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The geolocation endpoint answered with a non-success status.
    #[error("geolocation lookup failed: {0}")]
    LookupFailed(String),

    /// The geolocation endpoint did not report an egress address.
    #[error("no egress IP reported")]
    MissingEgressIp,

    /// Strict probes completed but took too long overall.
    #[error("too slow: {0:?}")]
    TooSlow(Duration),
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CheckError::Timeout
        } else if err.is_builder() {
            CheckError::Client(err)
        } else {
            CheckError::Request(err)
        }
    }
}

impl CheckError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CheckError::Timeout)
    }
}

/// Result type for a single check.
pub type CheckResult<T> = std::result::Result<T, CheckError>;
