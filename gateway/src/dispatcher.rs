//! Model-keyed dispatch of job requests onto the job queue.

use std::collections::HashMap;
use std::sync::Arc;

use mcp_common::McpRequest;
use thiserror::Error;

use crate::adapters::{BackendAdapter, BackendClient, MaceOptAdapter, RouteSchemas, XtbAdapter, ZeoppAdapter};
use crate::queue::{JobQueue, JobSubmission, QueueError};
use crate::trace::TraceId;

/// Errors returned synchronously by `dispatch`. No job exists afterwards.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("Task '{0}' already exists")]
    DuplicateTask(String),
    #[error("Job queue is full, retry later")]
    QueueFull,
    #[error("Job queue is shut down")]
    QueueClosed,
}

impl From<QueueError> for DispatchError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::DuplicateTask(id) => DispatchError::DuplicateTask(id),
            QueueError::Full => DispatchError::QueueFull,
            QueueError::Closed => DispatchError::QueueClosed,
        }
    }
}

/// Fixed mapping from model key to adapter, built once at startup.
#[derive(Clone, Default)]
pub struct AdapterTable {
    adapters: HashMap<&'static str, Arc<dyn BackendAdapter>>,
}

impl AdapterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three production backends sharing one client.
    pub fn standard(client: Arc<BackendClient>, schemas: Arc<RouteSchemas>) -> Self {
        Self::new()
            .with(Arc::new(MaceOptAdapter::new(client.clone())))
            .with(Arc::new(XtbAdapter::new(client.clone())))
            .with(Arc::new(ZeoppAdapter::new(client, schemas)))
    }

    /// Register an adapter under its own model key.
    pub fn with(mut self, adapter: Arc<dyn BackendAdapter>) -> Self {
        self.adapters.insert(adapter.model(), adapter);
        self
    }

    /// Adapter for an already lower-cased model key.
    pub fn get(&self, model: &str) -> Option<Arc<dyn BackendAdapter>> {
        self.adapters.get(model).cloned()
    }

    /// Registered model keys, sorted.
    pub fn models(&self) -> Vec<&'static str> {
        let mut models: Vec<&'static str> = self.adapters.keys().copied().collect();
        models.sort_unstable();
        models
    }
}

pub struct Dispatcher {
    table: AdapterTable,
    queue: Arc<JobQueue>,
}

impl Dispatcher {
    pub fn new(table: AdapterTable, queue: Arc<JobQueue>) -> Self {
        Self { table, queue }
    }

    /// Select the adapter for the request's model and enqueue the job.
    ///
    /// Returns the job id as soon as the job is queued; never waits on the backend.
    pub async fn dispatch(
        &self,
        request: McpRequest,
        trace_id: TraceId,
    ) -> Result<String, DispatchError> {
        let model = request.context.model_key();
        let Some(adapter) = self.table.get(&model) else {
            tracing::warn!(trace_id = %trace_id, "Rejected request for unsupported model '{}'", model);
            return Err(DispatchError::UnsupportedModel(request.context.model));
        };

        let task_id = request.context.requested_task_id().map(String::from);
        let McpRequest { input, context } = request;

        let task_id = self
            .queue
            .enqueue(JobSubmission {
                adapter,
                task_id,
                user: context.user,
                trace_id: trace_id.clone(),
                input,
                parameters: context.parameters,
            })
            .await?;

        tracing::info!(trace_id = %trace_id, "Dispatched {} task {}", model, task_id);
        Ok(task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{test_client, test_route_schemas, wait_for_status, EchoAdapter, GatedAdapter};
    use mcp_common::{JobStatus, McpContext, Parameters};
    use rstest::rstest;
    use serde_json::json;
    use std::time::Duration;

    fn request(model: &str, task_id: Option<&str>) -> McpRequest {
        McpRequest {
            input: json!("1\nH\nH 0 0 0\n"),
            context: McpContext {
                task_id: task_id.map(String::from),
                model: model.to_string(),
                user: None,
                parameters: Parameters::new(),
            },
        }
    }

    fn echo_dispatcher(queue: Arc<JobQueue>) -> Dispatcher {
        Dispatcher::new(AdapterTable::new().with(Arc::new(EchoAdapter)), queue)
    }

    #[test]
    fn test_standard_table_models() {
        let table = AdapterTable::standard(test_client(), Arc::new(test_route_schemas()));
        assert_eq!(table.models(), vec!["maceopt", "xtb", "zeopp"]);
        assert!(table.get("gaussian").is_none());
    }

    #[rstest]
    #[case("")]
    #[case("gaussian")]
    #[case("mace")]
    #[case("zeo++")]
    #[tokio::test]
    async fn test_unsupported_model_creates_no_job(#[case] model: &str) {
        let queue = Arc::new(JobQueue::new(8));
        let dispatcher = echo_dispatcher(queue.clone());

        let err = dispatcher
            .dispatch(request(model, Some("job-x")), TraceId::generate())
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::UnsupportedModel(model.to_string()));
        assert!(!queue.contains("job-x").await);
    }

    #[tokio::test]
    async fn test_model_is_case_insensitive() {
        let queue = Arc::new(JobQueue::new(8));
        queue.spawn_workers(1);
        let dispatcher = echo_dispatcher(queue.clone());

        let task_id = dispatcher
            .dispatch(request("  ECHO ", None), TraceId::generate())
            .await
            .unwrap();

        assert!(matches!(wait_for_status(&queue, &task_id).await, JobStatus::Succeeded(_)));
    }

    #[tokio::test]
    async fn test_caller_task_id_is_kept_and_duplicates_rejected() {
        let queue = Arc::new(JobQueue::new(8));
        let dispatcher = echo_dispatcher(queue.clone());

        let task_id = dispatcher
            .dispatch(request("echo", Some("job-7")), TraceId::generate())
            .await
            .unwrap();
        assert_eq!(task_id, "job-7");

        let err = dispatcher
            .dispatch(request("echo", Some("job-7")), TraceId::generate())
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::DuplicateTask("job-7".to_string()));
    }

    #[tokio::test]
    async fn test_dispatch_does_not_wait_for_backend() {
        let queue = Arc::new(JobQueue::new(8));
        queue.spawn_workers(1);
        let adapter = Arc::new(GatedAdapter::new());
        let dispatcher = Dispatcher::new(AdapterTable::new().with(adapter.clone()), queue.clone());

        let task_id = tokio::time::timeout(
            Duration::from_millis(500),
            dispatcher.dispatch(request("gated", None), TraceId::generate()),
        )
        .await
        .expect("dispatch blocked on the backend")
        .unwrap();

        adapter.wait_started().await;
        assert_eq!(queue.status(&task_id).await, JobStatus::Running);
        adapter.release();
        assert!(matches!(wait_for_status(&queue, &task_id).await, JobStatus::Succeeded(_)));
    }

    #[tokio::test]
    async fn test_full_queue_is_reported() {
        let queue = Arc::new(JobQueue::new(1));
        let dispatcher = echo_dispatcher(queue);

        dispatcher
            .dispatch(request("echo", None), TraceId::generate())
            .await
            .unwrap();
        let err = dispatcher
            .dispatch(request("echo", None), TraceId::generate())
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::QueueFull);
    }
}
