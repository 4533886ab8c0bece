//! Errors raised while fetching segments.

/// A request that never produced an HTTP response (connect failure, timeout, ...).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// libcurl reported an error.
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// The blocking task running the request panicked or was cancelled.
    #[error("transport task failed: {0}")]
    Task(String),
}

/// Terminal error returned by a fetcher. Recoverable conditions never leave the
/// fetcher; this is the only value that reaches the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Too many consecutive unexpected statuses without a successful fetch.
    #[error("segment {id}: giving up after {errors} consecutive unexpected responses (last HTTP {status})")]
    ErrorBudgetExhausted { id: u64, status: u32, errors: u32 },
}
