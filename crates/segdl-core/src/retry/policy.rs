use std::time::Duration;

/// Retryable failure classes seen by a fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No HTTP response at all (connect failure, timeout, reset).
    Transport,
    /// Server asked us to slow down (429).
    Throttled,
    /// Any other non-200 status. Counts against the error budget.
    UnexpectedStatus(u32),
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the same id after the given delay.
    RetryAfter(Duration),
    /// The error budget is spent; the fetcher must stop with a terminal error.
    GiveUp,
}

/// Fixed-delay retry policy with an error budget for unexpected statuses.
///
/// Transport failures and throttling are retried forever; only unexpected
/// statuses are bounded by `max_errors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive unexpected statuses after which the fetcher gives up.
    pub max_errors: u32,
    /// Delay after a transport failure.
    pub transport_delay: Duration,
    /// Delay after a 429.
    pub throttle_delay: Duration,
    /// Delay after an unexpected status that is still within budget.
    pub error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_errors: 10,
            transport_delay: Duration::from_secs(10),
            throttle_delay: Duration::from_secs(30),
            error_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Decide what to do after a failure of `kind`.
    ///
    /// `consecutive_errors` is the fetcher's counter *after* it has been bumped
    /// for this failure (only `UnexpectedStatus` bumps it).
    pub fn decide(&self, kind: ErrorKind, consecutive_errors: u32) -> RetryDecision {
        match kind {
            ErrorKind::Transport => RetryDecision::RetryAfter(self.transport_delay),
            ErrorKind::Throttled => RetryDecision::RetryAfter(self.throttle_delay),
            ErrorKind::UnexpectedStatus(_) => {
                if consecutive_errors >= self.max_errors {
                    RetryDecision::GiveUp
                } else {
                    RetryDecision::RetryAfter(self.error_delay)
                }
            }
        }
    }
}
