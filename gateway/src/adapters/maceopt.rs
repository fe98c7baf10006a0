//! MACE neural-network-potential structure optimizer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    forward_if_present, render_input, AdapterError, AdapterJob, BackendAdapter, BackendCall,
    BackendClient,
};

/// Optional parameters forwarded verbatim; the backend applies its own defaults otherwise.
const OPTIONAL_PARAMETERS: [&str; 2] = ["fmax", "device"];

pub struct MaceOptAdapter {
    client: Arc<BackendClient>,
}

impl MaceOptAdapter {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BackendAdapter for MaceOptAdapter {
    fn model(&self) -> &'static str {
        "maceopt"
    }

    fn build_call(&self, job: &AdapterJob) -> Result<BackendCall, AdapterError> {
        let mut fields = Vec::new();
        for name in OPTIONAL_PARAMETERS {
            forward_if_present(&job.parameters, name, &mut fields);
        }

        tracing::debug!("[maceopt] Built request for task {}", job.task_id);

        Ok(BackendCall {
            path: "/optimize".to_string(),
            file_field: "structure_file",
            file_suffix: ".xyz",
            content: render_input(&job.input),
            fields,
        })
    }

    async fn call(&self, job: &AdapterJob) -> Result<Value, AdapterError> {
        let call = self.build_call(job)?;
        self.client.send(self.model(), call, &job.trace_id).await
    }
}
