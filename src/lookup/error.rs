//! Lookup error types and retry handling

use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Why a single tower could not be located
///
/// These are soft failures: the tower is left unresolved and the rest of the
/// batch continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// Service answered with a non-success status
    #[error("HTTP Request Failed: {code} {reason}")]
    Status { code: u16, reason: String },
    /// No answer within the configured timeout
    #[error("lookup timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    /// Request could not be delivered
    #[error("connection failed: {details}")]
    Connection { details: String },
    /// Success status but the body was not a location
    #[error("invalid response body: {details}")]
    Decode { details: String },
}

impl LookupError {
    /// Error for a non-200 status, with the service's documented meaning
    pub fn from_status(code: u16) -> Self {
        LookupError::Status {
            code,
            reason: status_reason(code).to_string(),
        }
    }

    /// Whether repeating the request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            LookupError::Connection { .. } => true,
            LookupError::Status { code, .. } => *code >= 500,
            LookupError::Timeout { .. } | LookupError::Decode { .. } => false,
        }
    }
}

/// Human readable meaning of a geolocation service status code
pub fn status_reason(code: u16) -> &'static str {
    match code {
        400 => "key invalid or malformed request",
        403 => "quota or rate limit exceeded",
        404 => "not found",
        _ => "",
    }
}

/// Result type for lookup operations
pub type LookupResult<T> = Result<T, LookupError>;

/// Bounded retry with exponential backoff for transient lookup failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff after `current`; stays at `current` when the multiplier gives
    /// no valid duration (negative, NaN or overflowing)
    fn next_backoff(&self, current: Duration) -> Duration {
        let next = current.as_secs_f64() * self.backoff_multiplier;
        Duration::try_from_secs_f64(next).unwrap_or(current)
    }

    /// Run `operation` until it succeeds, fails permanently or retries run out
    pub fn run<T, F>(&self, mut operation: F) -> LookupResult<T>
    where
        F: FnMut() -> LookupResult<T>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            match operation() {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying lookup: {}",
                        e
                    );
                    thread::sleep(backoff);
                    backoff = self.next_backoff(backoff);
                }
                result => return result,
            }
        }
    }
}
