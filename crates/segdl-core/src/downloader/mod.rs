//! Segmented download pipeline.
//!
//! `run_pipeline` wires a shared [`SegmentIds`] source, N fetcher tasks and one
//! aggregator task. Fetchers race over the id source and push completed
//! segments into a bounded channel; the aggregator buffers them and appends
//! them to the output file strictly in id order. When every fetcher has
//! stopped, the last sender is gone, the aggregator runs its final flush and
//! the pipeline returns a [`PipelineReport`].
//!
//! A fetcher that exhausts its error budget returns a terminal [`FetchError`];
//! the coordinator then cancels the remaining fetchers, still lets the
//! aggregator flush what it has, and reports [`PipelineError::Aborted`].

mod aggregator;
mod worker;

#[cfg(test)]
pub(crate) mod mock;

pub use aggregator::{AggregateReport, Aggregator};
pub use worker::{FetcherExit, RetryStats};

use crate::retry::{FetchError, RetryPolicy};
use crate::segment::{SegmentIds, DEFAULT_MAX_SEGMENT_ID};
use crate::storage::AppendWriter;
use crate::transport::Transport;
use crate::url_model::SegmentUrl;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use worker::Fetcher;

/// Runtime parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// First segment id to fetch.
    pub start_id: u64,
    /// Number of concurrent fetchers.
    pub workers: usize,
    /// Exclusive upper bound on ids handed out.
    pub max_segment_id: u64,
    /// A 200 body shorter than this means end-of-stream.
    pub min_segment_bytes: usize,
    /// How often the aggregator drains its buffer into the file.
    pub flush_interval: Duration,
    /// Capacity of the fetcher -> aggregator channel.
    pub channel_capacity: usize,
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_id: 1,
            workers: 10,
            max_segment_id: DEFAULT_MAX_SEGMENT_ID,
            min_segment_bytes: 600,
            flush_interval: Duration::from_secs(5),
            channel_capacity: 64,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), PipelineError> {
        if self.workers == 0 {
            return Err(PipelineError::InvalidConfig("workers must be at least 1"));
        }
        if self.flush_interval.is_zero() {
            return Err(PipelineError::InvalidConfig("flush interval must be non-zero"));
        }
        if self.channel_capacity == 0 {
            return Err(PipelineError::InvalidConfig("channel capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub output: PathBuf,
    pub aggregate: AggregateReport,
    /// Retries summed over all fetchers that finished normally.
    pub retries: RetryStats,
}

impl PipelineReport {
    pub fn last_written_id(&self) -> Option<u64> {
        self.aggregate.last_written_id
    }

    /// False when segments were left behind a gap that never filled.
    pub fn is_complete(&self) -> bool {
        self.aggregate.stranded == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid pipeline config: {0}")]
    InvalidConfig(&'static str),
    /// A fetcher gave up. Segments received before the abort were still written.
    #[error("download aborted: {cause}")]
    Aborted {
        #[source]
        cause: FetchError,
        report: PipelineReport,
    },
    #[error("writing {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pipeline task failed: {0}")]
    Task(String),
}

/// Fetch segments `config.start_id..` from `template` and append them in order to `output`.
pub async fn run_pipeline<T: Transport>(
    template: SegmentUrl,
    transport: Arc<T>,
    output: &Path,
    config: &PipelineConfig,
) -> Result<PipelineReport, PipelineError> {
    config.validate()?;

    let ids = Arc::new(SegmentIds::new(config.start_id, config.max_segment_id));
    let template = Arc::new(template);
    let cancel = CancellationToken::new();
    let (segments_tx, segments_rx) = mpsc::channel(config.channel_capacity);

    let aggregator = Aggregator::new(AppendWriter::new(output), config.start_id);
    let aggregator_task = {
        let cancel = cancel.clone();
        let flush_interval = config.flush_interval;
        tokio::spawn(async move {
            let result = aggregator.run(segments_rx, flush_interval).await;
            if result.is_err() {
                cancel.cancel();
            }
            result
        })
    };

    let mut fetchers = JoinSet::new();
    for worker in 0..config.workers {
        let fetcher = Fetcher {
            worker,
            transport: Arc::clone(&transport),
            template: Arc::clone(&template),
            ids: Arc::clone(&ids),
            segments: segments_tx.clone(),
            policy: config.retry,
            min_segment_bytes: config.min_segment_bytes,
            cancel: cancel.clone(),
        };
        fetchers.spawn(fetcher.run());
    }
    // Fetchers own the only remaining senders.
    drop(segments_tx);
    tracing::info!(
        workers = config.workers,
        start_id = config.start_id,
        template = %template,
        output = %output.display(),
        "pipeline started"
    );

    let mut retries = RetryStats::default();
    let mut failure: Option<FetchError> = None;
    let mut panicked: Option<String> = None;
    while let Some(joined) = fetchers.join_next().await {
        match joined {
            Ok(Ok(outcome)) => {
                retries.merge(&outcome.stats);
                tracing::debug!(
                    worker = outcome.worker,
                    exit = ?outcome.exit,
                    segments = outcome.segments,
                    "fetcher finished"
                );
            }
            Ok(Err(err)) => {
                tracing::error!(%err, "fetcher gave up, cancelling the others");
                cancel.cancel();
                failure.get_or_insert(err);
            }
            Err(join_err) => {
                tracing::error!(error = %join_err, "fetcher task failed");
                cancel.cancel();
                panicked.get_or_insert_with(|| join_err.to_string());
            }
        }
    }
    tracing::debug!(next_unclaimed = ids.next_unclaimed(), "all fetchers stopped");

    let aggregate = aggregator_task
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))??;
    let report = PipelineReport {
        output: output.to_path_buf(),
        aggregate,
        retries,
    };

    if let Some(cause) = failure {
        return Err(PipelineError::Aborted { cause, report });
    }
    if let Some(msg) = panicked {
        return Err(PipelineError::Task(msg));
    }
    Ok(report)
}
