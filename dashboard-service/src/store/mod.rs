use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::{Stream, StreamExt};
use meter_core::domain::Reading;

use crate::pipeline::{PipelineError, Sink, Submission};

mod csv_log;

pub use csv_log::CsvReadingLog;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reading log io: {0}")]
    Io(#[from] std::io::Error),
    #[error("reading log csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("reading log line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Whether an append changed the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Recorded,
    /// An identical row (same instant, value and note) already exists.
    Duplicate,
}

/// The append-only collection of readings behind every estimate.
#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    async fn append(&self, reading: &Reading) -> Result<AppendOutcome, StoreError>;
    /// All readings in arrival order.
    async fn snapshot(&self) -> Result<Vec<Reading>, StoreError>;
}

/// Terminal pipeline stage: records every validated submission in the store,
/// retrying transient failures with linear backoff.
pub struct StoreSink {
    store: Arc<dyn ReadingStore>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl StoreSink {
    pub fn new(store: Arc<dyn ReadingStore>, max_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            store,
            max_retries,
            retry_backoff,
        }
    }

    async fn record(&self, submission: &Submission<Reading>) -> Result<(), PipelineError> {
        let mut attempt: u32 = 0;
        loop {
            match self.store.append(&submission.payload).await {
                Ok(outcome) => {
                    match outcome {
                        AppendOutcome::Recorded => {
                            metrics::counter!("readings_recorded_total").increment(1);
                        }
                        AppendOutcome::Duplicate => {
                            metrics::counter!("readings_duplicate_skipped_total").increment(1);
                        }
                    }
                    if let Ok(elapsed) = SystemTime::now().duration_since(submission.received_at) {
                        metrics::histogram!("reading_submit_latency_seconds")
                            .record(elapsed.as_secs_f64());
                    }
                    return Ok(());
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let sleep_for = self.retry_backoff * attempt;
                    tracing::warn!(error = %e, attempt, "append failed, retrying with backoff");
                    tokio::time::sleep(sleep_for).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "append failed, giving up");
                    metrics::counter!("reading_log_append_errors_total").increment(1);
                    return Err(PipelineError::Sink(e.to_string()));
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Sink<Reading> for StoreSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Submission<Reading>, PipelineError>> + Send + Unpin + 'static,
    {
        while let Some(item) = input.next().await {
            let submission = match item {
                Ok(sub) => sub,
                Err(e) => {
                    // Rejected upstream; already counted there.
                    tracing::warn!(error = %e, "dropping rejected submission");
                    continue;
                }
            };
            self.record(&submission).await?;
        }
        Ok(())
    }
}
