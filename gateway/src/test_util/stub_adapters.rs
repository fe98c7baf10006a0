//! In-process adapters that never touch the network.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::adapters::{AdapterError, AdapterJob, BackendAdapter, BackendCall};

fn stub_call(job: &AdapterJob) -> BackendCall {
    BackendCall {
        path: "/stub".to_string(),
        file_field: "file",
        file_suffix: ".txt",
        content: job.input.to_string(),
        fields: vec![],
    }
}

/// Succeeds immediately, echoing the task id and input.
pub struct EchoAdapter;

#[async_trait]
impl BackendAdapter for EchoAdapter {
    fn model(&self) -> &'static str {
        "echo"
    }

    fn build_call(&self, job: &AdapterJob) -> Result<BackendCall, AdapterError> {
        Ok(stub_call(job))
    }

    async fn call(&self, job: &AdapterJob) -> Result<Value, AdapterError> {
        Ok(json!({ "task_id": job.task_id, "input": job.input }))
    }
}

/// Always fails validation.
pub struct FailingAdapter;

#[async_trait]
impl BackendAdapter for FailingAdapter {
    fn model(&self) -> &'static str {
        "failing"
    }

    fn build_call(&self, _job: &AdapterJob) -> Result<BackendCall, AdapterError> {
        Err(AdapterError::Validation("missing 'output_filename'".to_string()))
    }

    async fn call(&self, job: &AdapterJob) -> Result<Value, AdapterError> {
        self.build_call(job).map(|_| Value::Null)
    }
}

/// Panics inside the call.
pub struct PanickingAdapter;

#[async_trait]
impl BackendAdapter for PanickingAdapter {
    fn model(&self) -> &'static str {
        "panicking"
    }

    fn build_call(&self, job: &AdapterJob) -> Result<BackendCall, AdapterError> {
        Ok(stub_call(job))
    }

    async fn call(&self, _job: &AdapterJob) -> Result<Value, AdapterError> {
        panic!("adapter blew up");
    }
}

/// Blocks inside the call until `release` is called, so tests can observe `running`.
pub struct GatedAdapter {
    started: Notify,
    gate: Notify,
}

impl GatedAdapter {
    pub fn new() -> Self {
        Self {
            started: Notify::new(),
            gate: Notify::new(),
        }
    }

    /// Resolves once a worker has entered `call`.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

impl Default for GatedAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendAdapter for GatedAdapter {
    fn model(&self) -> &'static str {
        "gated"
    }

    fn build_call(&self, job: &AdapterJob) -> Result<BackendCall, AdapterError> {
        Ok(stub_call(job))
    }

    async fn call(&self, job: &AdapterJob) -> Result<Value, AdapterError> {
        self.started.notify_one();
        self.gate.notified().await;
        Ok(json!({ "task_id": job.task_id, "gated": true }))
    }
}
