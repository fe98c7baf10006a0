//! Worker loop executing queued jobs.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};
use tracing::Instrument;

use super::store::{JobOutcome, JobStore};
use super::QueuedJob;

/// Pull jobs from the shared receiver until the queue is dropped.
pub(super) async fn run_worker(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    store: Arc<JobStore>,
) {
    tracing::debug!("Worker {} started", worker_id);

    loop {
        let next = { receiver.lock().await.recv().await };
        let Some(queued) = next else {
            break;
        };
        execute(worker_id, queued, &store).await;
    }

    tracing::debug!("Worker {} stopped", worker_id);
}

/// Run one job to a terminal state. Adapter errors and panics become a
/// failed record; nothing propagates out of the worker.
pub(super) async fn execute(worker_id: usize, queued: QueuedJob, store: &JobStore) {
    let QueuedJob { adapter, job } = queued;
    let task_id = job.task_id.clone();
    let model = adapter.model();
    let span = tracing::info_span!(
        "job",
        task_id = %job.task_id,
        trace_id = %job.trace_id,
        model = model,
        worker = worker_id
    );

    async move {
        if !store.mark_running(&task_id).await {
            tracing::warn!("Job {} is no longer pending, skipping", task_id);
            return;
        }

        tracing::info!("Start {} task {}", model, task_id);
        let started = Instant::now();

        let call = tokio::spawn(
            async move { adapter.call(&job).await }.instrument(tracing::Span::current()),
        );

        let outcome = match call.await {
            Ok(Ok(payload)) => {
                tracing::info!(
                    duration_ms = %started.elapsed().as_millis(),
                    "{} task {} completed",
                    model,
                    task_id
                );
                JobOutcome::Succeeded(payload)
            }
            Ok(Err(e)) => {
                if e.is_validation() {
                    tracing::warn!("{} task {} rejected: {}", model, task_id, e);
                } else {
                    tracing::error!("{} task {} failed: {}", model, task_id, e);
                }
                JobOutcome::Failed(e.to_string())
            }
            Err(e) => {
                tracing::error!("{} task {} aborted: {}", model, task_id, e);
                JobOutcome::Failed(format!("Job execution aborted: {}", e))
            }
        };

        store.finish(&task_id, outcome).await;
    }
    .instrument(span)
    .await
}
