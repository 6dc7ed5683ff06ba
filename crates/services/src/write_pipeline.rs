//! Background delivery of ledger rows.
//!
//! `submit` never waits on the ledger: jobs go onto a queue, a dispatcher
//! task runs each one in a `JoinSet` bounded by `max_in_flight`, and every job
//! ends with exactly one [`WriteReport`] on the report channel.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use storage::repository::{LedgerRow, RatingLedger, StorageError};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::SurveyError;

//
// ─── POLICIES ─────────────────────────────────────────────────────────────────
//

/// How rate-limited writes are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Fixed wait between a rate-limited attempt and the next one.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 5;
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(60);

    #[must_use]
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES, Self::DEFAULT_BACKOFF)
    }
}

/// What happens to outstanding jobs on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Finish queued and in-flight jobs, including pending backoffs.
    Drain,
    /// Cancel everything; unfinished rows are reported as abandoned.
    Abandon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    pub max_in_flight: usize,
}

impl PipelineConfig {
    pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_in_flight: Self::DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

//
// ─── REPORTS ──────────────────────────────────────────────────────────────────
//

pub type JobId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { attempts: u32 },
    /// Rate limited on every attempt.
    Dropped { attempts: u32 },
    /// A non-retryable failure.
    Failed { message: String },
    /// Cancelled by an abandoning shutdown.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub job_id: JobId,
    pub rows: usize,
    pub outcome: WriteOutcome,
}

impl WriteReport {
    /// Whether the outcome should be shown to the respondent.
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(self.outcome, WriteOutcome::Failed { .. })
    }
}

/// Receiving end of the report channel.
pub type WriteReports = mpsc::UnboundedReceiver<WriteReport>;

//
// ─── PIPELINE ─────────────────────────────────────────────────────────────────
//

struct WriteJob {
    id: JobId,
    rows: Vec<LedgerRow>,
}

pub struct WritePipeline {
    sender: Mutex<Option<mpsc::UnboundedSender<WriteJob>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    next_id: AtomicU64,
}

impl WritePipeline {
    /// Start the dispatcher on the current tokio runtime.
    ///
    /// Must be called from within a runtime.
    #[must_use]
    pub fn spawn(ledger: Arc<dyn RatingLedger>, config: PipelineConfig) -> (Self, WriteReports) {
        let (sender, queue) = mpsc::unbounded_channel();
        let (report_tx, reports) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let dispatcher = tokio::spawn(dispatch(
            ledger,
            config,
            queue,
            report_tx,
            cancel.clone(),
        ));

        let pipeline = Self {
            sender: Mutex::new(Some(sender)),
            dispatcher: Mutex::new(Some(dispatcher)),
            cancel,
            next_id: AtomicU64::new(1),
        };
        (pipeline, reports)
    }

    /// Queue rows for writing and return immediately. A single row is sent
    /// with `append_row`, several with one `append_rows`.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::PipelineClosed` after shutdown.
    pub fn submit(&self, rows: Vec<LedgerRow>) -> Result<JobId, SurveyError> {
        let guard = self
            .sender
            .lock()
            .map_err(|_| SurveyError::PipelineClosed)?;
        let sender = guard.as_ref().ok_or(SurveyError::PipelineClosed)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let count = rows.len();
        sender
            .send(WriteJob { id, rows })
            .map_err(|_| SurveyError::PipelineClosed)?;
        debug!(job_id = id, rows = count, "queued ledger write");
        Ok(id)
    }

    /// Stop accepting jobs and wait for the dispatcher to finish under
    /// `policy`. Later calls return immediately.
    pub async fn shutdown(&self, policy: ShutdownPolicy) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
        if policy == ShutdownPolicy::Abandon {
            self.cancel.cancel();
        }

        let handle = self.dispatcher.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(error = %err, "write dispatcher panicked");
            }
        }
        info!(?policy, "write pipeline stopped");
    }
}

impl Drop for WritePipeline {
    fn drop(&mut self) {
        // Dropping the sender lets the dispatcher drain and exit on its own.
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
    }
}

async fn dispatch(
    ledger: Arc<dyn RatingLedger>,
    config: PipelineConfig,
    mut queue: mpsc::UnboundedReceiver<WriteJob>,
    reports: mpsc::UnboundedSender<WriteReport>,
    cancel: CancellationToken,
) {
    let permits = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(err) = joined {
                    error!(error = %err, "write task panicked");
                }
            }
            job = queue.recv() => {
                let Some(job) = job else { break };
                let permit = tokio::select! {
                    () = cancel.cancelled() => {
                        send_report(&reports, abandoned(&job));
                        break;
                    }
                    permit = Arc::clone(&permits).acquire_owned() => permit,
                };
                let Ok(permit) = permit else {
                    send_report(&reports, abandoned(&job));
                    break;
                };

                let ledger = Arc::clone(&ledger);
                let reports = reports.clone();
                let cancel = cancel.clone();
                let retry = config.retry;
                tasks.spawn(async move {
                    let report = run_job(ledger.as_ref(), retry, job, &cancel).await;
                    send_report(&reports, report);
                    drop(permit);
                });
            }
        }
    }

    if cancel.is_cancelled() {
        queue.close();
        while let Some(job) = queue.recv().await {
            send_report(&reports, abandoned(&job));
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            error!(error = %err, "write task panicked");
        }
    }
}

async fn run_job(
    ledger: &dyn RatingLedger,
    retry: RetryPolicy,
    job: WriteJob,
    cancel: &CancellationToken,
) -> WriteReport {
    let mut attempts = 0_u32;
    let outcome = loop {
        attempts += 1;
        let result = tokio::select! {
            () = cancel.cancelled() => break WriteOutcome::Abandoned,
            result = write_rows(ledger, &job.rows) => result,
        };

        match result {
            Ok(()) => break WriteOutcome::Written { attempts },
            Err(err) if err.is_rate_limited() => {
                if attempts > retry.max_retries {
                    break WriteOutcome::Dropped { attempts };
                }
                warn!(
                    job_id = job.id,
                    attempt = attempts,
                    backoff_secs = retry.backoff.as_secs(),
                    "ledger rate limited, retrying"
                );
                tokio::select! {
                    () = cancel.cancelled() => break WriteOutcome::Abandoned,
                    () = tokio::time::sleep(retry.backoff) => {}
                }
            }
            Err(err) => {
                break WriteOutcome::Failed {
                    message: err.to_string(),
                };
            }
        }
    };

    WriteReport {
        job_id: job.id,
        rows: job.rows.len(),
        outcome,
    }
}

async fn write_rows(ledger: &dyn RatingLedger, rows: &[LedgerRow]) -> Result<(), StorageError> {
    match rows {
        [] => Ok(()),
        [row] => ledger.append_row(row).await,
        _ => ledger.append_rows(rows).await,
    }
}

fn abandoned(job: &WriteJob) -> WriteReport {
    WriteReport {
        job_id: job.id,
        rows: job.rows.len(),
        outcome: WriteOutcome::Abandoned,
    }
}

fn send_report(reports: &mpsc::UnboundedSender<WriteReport>, report: WriteReport) {
    match &report.outcome {
        WriteOutcome::Written { attempts } => {
            debug!(job_id = report.job_id, rows = report.rows, attempts, "ledger write done");
        }
        WriteOutcome::Dropped { attempts } => {
            warn!(
                job_id = report.job_id,
                rows = report.rows,
                attempts,
                "ledger write dropped after repeated rate limiting"
            );
        }
        WriteOutcome::Failed { message } => {
            error!(job_id = report.job_id, rows = report.rows, %message, "ledger write failed");
        }
        WriteOutcome::Abandoned => {
            warn!(job_id = report.job_id, rows = report.rows, "ledger write abandoned at shutdown");
        }
    }
    // Nobody listening is fine; the outcome is already logged.
    let _ = reports.send(report);
}
