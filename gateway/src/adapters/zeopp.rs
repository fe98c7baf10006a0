//! Zeo++ porous-structure analysis.
//!
//! The backend exposes one upload endpoint per analysis route
//! (`/api/{route}`). Which parameters a route needs comes from the route
//! schema file loaded at startup; the set of routes in that file is the
//! whitelist.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    forward_if_present, render_input, AdapterError, AdapterJob, BackendAdapter, BackendCall,
    BackendClient, RouteSchemas,
};

/// Result file name; `{task_id}.res` when the caller gives none.
const OUTPUT_FILENAME: &str = "output_filename";

/// Textual structure formats understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    /// Crystallographic Information File, starts with a `data_` block.
    Cif,
    /// Cerius2 CSSR.
    Cssr,
}

impl StructureFormat {
    /// Suffix of the uploaded file; the backend picks its parser from it.
    pub fn suffix(&self) -> &'static str {
        match self {
            StructureFormat::Cif => ".cif",
            StructureFormat::Cssr => ".cssr",
        }
    }
}

/// Classify structure content by its leading bytes.
///
/// Content whose first non-whitespace characters are `data_` (any case) is
/// CIF; everything else is treated as CSSR.
pub fn classify_structure(content: &str) -> StructureFormat {
    let is_cif = content
        .trim_start()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data_"));

    if is_cif {
        StructureFormat::Cif
    } else {
        StructureFormat::Cssr
    }
}

pub struct ZeoppAdapter {
    client: Arc<BackendClient>,
    schemas: Arc<RouteSchemas>,
}

impl ZeoppAdapter {
    pub fn new(client: Arc<BackendClient>, schemas: Arc<RouteSchemas>) -> Self {
        Self { client, schemas }
    }

    fn select_route(&self, job: &AdapterJob) -> Result<String, AdapterError> {
        match job.parameters.get("route") {
            None | Some(Value::Null) => {
                tracing::warn!(
                    "[zeopp] No route given for task {}, defaulting to '{}'",
                    job.task_id,
                    self.schemas.default_route()
                );
                Ok(self.schemas.default_route().to_string())
            }
            Some(Value::String(route)) if route.trim().is_empty() => {
                tracing::warn!(
                    "[zeopp] Empty route for task {}, defaulting to '{}'",
                    job.task_id,
                    self.schemas.default_route()
                );
                Ok(self.schemas.default_route().to_string())
            }
            Some(Value::String(route)) => Ok(route.trim().to_string()),
            Some(other) => Err(AdapterError::Validation(format!(
                "Zeo++ route must be a string, got {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl BackendAdapter for ZeoppAdapter {
    fn model(&self) -> &'static str {
        "zeopp"
    }

    fn build_call(&self, job: &AdapterJob) -> Result<BackendCall, AdapterError> {
        let route = self.select_route(job)?;
        let schema = self
            .schemas
            .get(&route)
            .ok_or_else(|| AdapterError::Validation(format!("Unsupported Zeo++ route: {}", route)))?;

        let mut parameters = job.parameters.clone();
        if parameters.get(OUTPUT_FILENAME).map_or(true, Value::is_null) {
            parameters.insert(
                OUTPUT_FILENAME.to_string(),
                Value::String(format!("{}.res", job.task_id)),
            );
        }

        let missing: Vec<&str> = schema
            .required
            .iter()
            .map(String::as_str)
            .filter(|name| parameters.get(*name).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(AdapterError::Validation(format!(
                "Missing required parameter(s) for Zeo++ route '{}': {}",
                route,
                missing.join(", ")
            )));
        }

        let mut fields = Vec::new();
        for name in schema.required.iter().chain(schema.optional.iter()) {
            forward_if_present(&parameters, name, &mut fields);
        }

        let content = render_input(&job.input);
        let format = classify_structure(&content);

        tracing::debug!(
            "[zeopp] Task {} -> route '{}' ({:?} input)",
            job.task_id,
            route,
            format
        );

        Ok(BackendCall {
            path: format!("/api/{}", route),
            file_field: "structure_file",
            file_suffix: format.suffix(),
            content,
            fields,
        })
    }

    async fn call(&self, job: &AdapterJob) -> Result<Value, AdapterError> {
        let call = self.build_call(job)?;
        self.client.send(self.model(), call, &job.trace_id).await
    }
}
