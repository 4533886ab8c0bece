//! Segment fetcher: claim an id, GET it until a verdict, emit or stop.

use crate::retry::{
    classify_response, EndOfStream, ErrorKind, FetchError, RetryDecision, RetryPolicy, Verdict,
};
use crate::segment::{Segment, SegmentIds};
use crate::transport::Transport;
use crate::url_model::SegmentUrl;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How a fetcher stopped, when it stopped without a terminal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetcherExit {
    /// The remote signalled there is nothing at `id`.
    EndOfStream { id: u64, reason: EndOfStream },
    /// The id source hit its ceiling.
    IdsExhausted,
    /// The pipeline was cancelled.
    Cancelled,
    /// The aggregator stopped receiving.
    AggregatorGone,
}

/// Retry counters for one fetcher (or summed over a pipeline).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryStats {
    pub transport: u32,
    pub throttled: u32,
    pub unexpected: u32,
}

impl RetryStats {
    fn record(&mut self, kind: ErrorKind) {
        match kind {
            ErrorKind::Transport => self.transport += 1,
            ErrorKind::Throttled => self.throttled += 1,
            ErrorKind::UnexpectedStatus(_) => self.unexpected += 1,
        }
    }

    pub fn merge(&mut self, other: &RetryStats) {
        self.transport += other.transport;
        self.throttled += other.throttled;
        self.unexpected += other.unexpected;
    }
}

#[derive(Debug)]
pub(crate) struct FetcherOutcome {
    pub(crate) worker: usize,
    pub(crate) exit: FetcherExit,
    pub(crate) segments: u64,
    pub(crate) stats: RetryStats,
}

enum Fetched {
    Segment(Vec<u8>),
    Stop(FetcherExit),
}

pub(crate) struct Fetcher<T> {
    pub(crate) worker: usize,
    pub(crate) transport: Arc<T>,
    pub(crate) template: Arc<SegmentUrl>,
    pub(crate) ids: Arc<SegmentIds>,
    pub(crate) segments: mpsc::Sender<Segment>,
    pub(crate) policy: RetryPolicy,
    pub(crate) min_segment_bytes: usize,
    pub(crate) cancel: CancellationToken,
}

impl<T: Transport> Fetcher<T> {
    /// Claim and fetch ids until end-of-stream, cancellation, or a terminal error.
    pub(crate) async fn run(self) -> Result<FetcherOutcome, FetchError> {
        let mut stats = RetryStats::default();
        // Consecutive unexpected statuses since the last successful segment.
        let mut consecutive_errors = 0u32;
        let mut segments = 0u64;

        let exit = loop {
            if self.cancel.is_cancelled() {
                break FetcherExit::Cancelled;
            }
            let Some(id) = self.ids.claim() else {
                break FetcherExit::IdsExhausted;
            };
            match self.fetch(id, &mut consecutive_errors, &mut stats).await? {
                Fetched::Segment(payload) => {
                    tracing::trace!(
                        worker = self.worker,
                        id,
                        len = payload.len(),
                        "segment fetched"
                    );
                    if self.segments.send(Segment::new(id, payload)).await.is_err() {
                        break FetcherExit::AggregatorGone;
                    }
                    segments += 1;
                }
                Fetched::Stop(exit) => break exit,
            }
        };

        Ok(FetcherOutcome {
            worker: self.worker,
            exit,
            segments,
            stats,
        })
    }

    /// Fetch one id, retrying the same id until a verdict other than `Retry`.
    async fn fetch(
        &self,
        id: u64,
        consecutive_errors: &mut u32,
        stats: &mut RetryStats,
    ) -> Result<Fetched, FetchError> {
        let worker = self.worker;
        let url = self.template.for_id(id);
        loop {
            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(Fetched::Stop(FetcherExit::Cancelled)),
                response = self.transport.get(&url) => response,
            };

            let kind = match response {
                Err(err) => {
                    tracing::warn!(worker, id, error = %err, "request failed");
                    ErrorKind::Transport
                }
                Ok(response) => {
                    let (status, len) = (response.status, response.body.len());
                    match classify_response(response, self.min_segment_bytes) {
                        Verdict::Segment(body) => {
                            *consecutive_errors = 0;
                            return Ok(Fetched::Segment(body));
                        }
                        Verdict::EndOfStream(reason) => {
                            tracing::info!(worker, id, ?reason, "end of stream, fetcher finishing");
                            return Ok(Fetched::Stop(FetcherExit::EndOfStream { id, reason }));
                        }
                        Verdict::Retry(kind) => {
                            tracing::debug!(worker, id, status, len, "retryable response");
                            kind
                        }
                    }
                }
            };

            if matches!(kind, ErrorKind::UnexpectedStatus(_)) {
                *consecutive_errors += 1;
            }
            stats.record(kind);

            let delay = match self.policy.decide(kind, *consecutive_errors) {
                RetryDecision::RetryAfter(delay) => delay,
                RetryDecision::GiveUp => {
                    let status = match kind {
                        ErrorKind::UnexpectedStatus(status) => status,
                        ErrorKind::Transport | ErrorKind::Throttled => 0,
                    };
                    tracing::error!(
                        worker,
                        id,
                        status,
                        errors = *consecutive_errors,
                        "error budget exhausted"
                    );
                    return Err(FetchError::ErrorBudgetExhausted {
                        id,
                        status,
                        errors: *consecutive_errors,
                    });
                }
            };

            match kind {
                ErrorKind::Throttled => {
                    tracing::warn!(worker, id, ?delay, "too many requests, backing off")
                }
                ErrorKind::UnexpectedStatus(status) => tracing::warn!(
                    worker,
                    id,
                    status,
                    errors = *consecutive_errors,
                    ?delay,
                    "unexpected response, retrying"
                ),
                ErrorKind::Transport => {
                    tracing::debug!(worker, id, ?delay, "retrying after transport failure")
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(Fetched::Stop(FetcherExit::Cancelled)),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
