//! Typed error types for the print client.

use std::time::Duration;

/// Gateway dispatch failures, categorized by type.
///
/// Use [`DispatchError::is_retryable()`] to classify transient vs permanent
/// failures. Gateway-reported failures and malformed results are never
/// retryable: the gateway may already have printed some labels.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    // -- Transport --
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out ({timeout:?})")]
    Timeout {
        /// Endpoint that was called.
        url: String,
        /// The configured request timeout.
        timeout: Duration,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The gateway could not be reached.
    #[error("could not connect to {url}")]
    Connect {
        /// Endpoint that was called.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Any other HTTP client failure.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The gateway answered with a non-success status code.
    #[error("gateway returned HTTP {code}: {body}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    // -- Response --
    /// The response body was not the expected JSON shape.
    #[error("could not decode gateway response: {0}")]
    Decode(String),

    /// The gateway reported the batch as not completed.
    #[error("gateway reported '{status}': {message}")]
    Gateway {
        /// Status string reported by the gateway.
        status: String,
        /// Message reported by the gateway.
        message: String,
    },

    /// The gateway's counts are missing or do not add up.
    #[error("inconsistent print result: {0}")]
    InconsistentResult(String),

    // -- Retry / control --
    /// All retry attempts have been exhausted.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Total number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last_error: Box<DispatchError>,
    },

    /// The caller cancelled the dispatch.
    #[error("dispatch cancelled")]
    Cancelled,

    // -- Configuration --
    /// An invalid configuration was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DispatchError {
    /// Returns `true` if this error is transient and worth retrying.
    ///
    /// Timeouts, connection failures, `5xx` and `429` responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::Timeout { .. } | DispatchError::Connect { .. } => true,
            DispatchError::Status { code, .. } => *code >= 500 || *code == 429,
            _ => false,
        }
    }

    /// Classify a `reqwest` failure for `url`.
    pub(crate) fn from_reqwest(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::Timeout {
                url: url.to_string(),
                timeout,
                source: err,
            }
        } else if err.is_connect() {
            DispatchError::Connect {
                url: url.to_string(),
                source: err,
            }
        } else if err.is_decode() {
            DispatchError::Decode(err.to_string())
        } else {
            DispatchError::Http(err)
        }
    }

    /// The innermost error, looking through [`DispatchError::RetriesExhausted`].
    pub fn root(&self) -> &DispatchError {
        match self {
            DispatchError::RetriesExhausted { last_error, .. } => last_error.root(),
            other => other,
        }
    }
}
