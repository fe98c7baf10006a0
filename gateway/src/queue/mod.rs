//! Asynchronous job queue and worker pool.
//!
//! `enqueue` records a job as pending and hands it to a bounded channel
//! without waiting. A fixed pool of workers shares the receiving end, so each
//! job is picked up by exactly one worker, which drives its record to a
//! terminal state.

mod status;
mod store;
mod worker;

pub use status::job_status;
pub use store::{JobOutcome, JobRecord, JobStore};

use std::sync::Arc;
use std::time::Duration;

use mcp_common::{JobStatus, Parameters};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::adapters::{AdapterJob, BackendAdapter};
use crate::config::QueueConfig;
use crate::trace::TraceId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Task '{0}' already exists")]
    DuplicateTask(String),
    #[error("Job queue is full")]
    Full,
    #[error("Job queue is closed")]
    Closed,
}

/// A unit of work submitted to the queue.
pub struct JobSubmission {
    pub adapter: Arc<dyn BackendAdapter>,
    /// Caller-supplied id; a UUID is generated when `None`.
    pub task_id: Option<String>,
    pub user: Option<String>,
    pub trace_id: TraceId,
    pub input: Value,
    pub parameters: Parameters,
}

/// A job waiting for a worker.
pub(crate) struct QueuedJob {
    adapter: Arc<dyn BackendAdapter>,
    job: AdapterJob,
}

pub struct JobQueue {
    store: Arc<JobStore>,
    sender: mpsc::Sender<QueuedJob>,
    receiver: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` jobs that wait for a worker.
    ///
    /// No workers run until `spawn_workers` is called.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            store: Arc::new(JobStore::new()),
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Create the queue, start its workers and, if configured, the expiry sweeper.
    pub fn start(config: &QueueConfig) -> Arc<Self> {
        let queue = Arc::new(Self::new(config.capacity));
        queue.spawn_workers(config.workers.max(1));
        if let Some(ttl) = config.result_ttl_secs {
            queue.spawn_sweeper(Duration::from_secs(ttl));
        }
        queue
    }

    /// Start `count` workers pulling from this queue.
    pub fn spawn_workers(&self, count: usize) -> Vec<JoinHandle<()>> {
        tracing::info!("Starting {} job workers", count);
        (0..count)
            .map(|worker_id| {
                tokio::spawn(worker::run_worker(
                    worker_id,
                    self.receiver.clone(),
                    self.store.clone(),
                ))
            })
            .collect()
    }

    /// Periodically drop terminal records older than `ttl`.
    pub fn spawn_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let store = self.store.clone();
        let period = ttl.clamp(Duration::from_secs(1), Duration::from_secs(60));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let removed = store.remove_expired(ttl_secs(ttl)).await;
                if !removed.is_empty() {
                    tracing::info!("Expired {} job records", removed.len());
                }
            }
        })
    }

    /// Record the job as pending and schedule it. Never waits for a worker.
    ///
    /// A queue slot is reserved before the record is created, so a rejected
    /// submission is never visible to pollers.
    pub async fn enqueue(&self, submission: JobSubmission) -> Result<String, QueueError> {
        let task_id = submission
            .task_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let model = submission.adapter.model();

        let permit = match self.sender.try_reserve() {
            Ok(permit) => permit,
            Err(TrySendError::Full(())) => {
                tracing::warn!("Job queue full, rejected {} task {}", model, task_id);
                return Err(QueueError::Full);
            }
            Err(TrySendError::Closed(())) => return Err(QueueError::Closed),
        };

        let record = JobRecord::pending(
            task_id.clone(),
            model.to_string(),
            submission.user,
            submission.trace_id.clone(),
        );
        if !self.store.insert(record).await {
            return Err(QueueError::DuplicateTask(task_id));
        }

        permit.send(QueuedJob {
            adapter: submission.adapter,
            job: AdapterJob {
                task_id: task_id.clone(),
                trace_id: submission.trace_id,
                input: submission.input,
                parameters: submission.parameters,
            },
        });

        tracing::debug!("Enqueued {} task {}", model, task_id);
        Ok(task_id)
    }

    /// Snapshot of a job record; `None` if the id was never enqueued.
    pub async fn poll(&self, task_id: &str) -> Option<JobRecord> {
        self.store.get(task_id).await
    }

    /// Caller-visible status of a job id.
    pub async fn status(&self, task_id: &str) -> JobStatus {
        job_status(self.poll(task_id).await.as_ref())
    }

    pub async fn contains(&self, task_id: &str) -> bool {
        self.store.contains(task_id).await
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }
}

/// TTL in whole seconds, saturating at `i64::MAX`.
fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}
