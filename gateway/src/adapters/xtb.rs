//! xTB semi-empirical geometry optimizer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    form_value, render_input, AdapterError, AdapterJob, BackendAdapter, BackendCall, BackendClient,
};

/// Always-sent parameters and their defaults: molecular charge, unpaired
/// electrons, GFN method variant.
const DEFAULTS: [(&str, i64); 3] = [("charge", 0), ("uhf", 0), ("gfn", 1)];

pub struct XtbAdapter {
    client: Arc<BackendClient>,
}

impl XtbAdapter {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BackendAdapter for XtbAdapter {
    fn model(&self) -> &'static str {
        "xtb"
    }

    fn build_call(&self, job: &AdapterJob) -> Result<BackendCall, AdapterError> {
        let fields = DEFAULTS
            .iter()
            .map(|(name, default)| {
                let value = job
                    .parameters
                    .get(*name)
                    .and_then(form_value)
                    .unwrap_or_else(|| default.to_string());
                (name.to_string(), value)
            })
            .collect();

        Ok(BackendCall {
            path: "/optimize".to_string(),
            file_field: "file",
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
