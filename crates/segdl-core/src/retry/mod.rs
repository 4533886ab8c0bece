//! Retry and backoff policy.
//!
//! This module classifies each segment response (transport failure, "not found"
//! marker, throttling, unexpected status, undersized or full body) and decides
//! how long a fetcher waits before retrying, so that the worker loop only has to
//! act on a verdict.

mod classify;
mod error;
mod policy;

pub use classify::{body_says_not_found, classify_response, EndOfStream, Verdict};
pub use error::{FetchError, TransportError};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
