//! Retry policy with exponential backoff
//!
//! Failures are classified as transient (worth another attempt) or permanent.
//! Transient failures are retried after `base, 2 * base, 4 * base, ...` until
//! the attempt budget is spent.

use reqwest::StatusCode;
use std::time::Duration;

/// How a failed attempt should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeouts, connection errors, 5xx and 429
    Transient,
    /// Everything retrying cannot fix
    Permanent,
}

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; at least one attempt is always made
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to sleep after the given failed attempt (1-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// Returns the delay before the next attempt, or None to give up
    pub fn next_delay(&self, kind: FailureKind, attempt: u32) -> Option<Duration> {
        match kind {
            FailureKind::Permanent => None,
            FailureKind::Transient if attempt >= self.max_attempts => None,
            FailureKind::Transient => Some(self.delay_for(attempt)),
        }
    }
}

/// Classifies a non-success HTTP status
pub fn classify_status(status: StatusCode) -> FailureKind {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        FailureKind::Transient
    } else {
        FailureKind::Permanent
    }
}

/// Classifies a transport-level error
///
/// Anything that failed before a status line arrived is worth retrying,
/// except malformed requests and redirect loops.
pub fn classify_error(error: &reqwest::Error) -> FailureKind {
    if error.is_builder() || error.is_redirect() {
        FailureKind::Permanent
    } else if let Some(status) = error.status() {
        classify_status(status)
    } else {
        FailureKind::Transient
    }
}
