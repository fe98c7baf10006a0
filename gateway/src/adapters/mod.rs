//! Backend adapter abstraction layer.
//!
//! Every compute backend accepts a multipart upload with one structure file
//! and a handful of string form fields, but each one names its fields,
//! endpoints and defaults differently. The `BackendAdapter` trait turns a
//! generic job into a `BackendCall` for one backend; `BackendClient` performs
//! that call the same way for all of them.

mod client;
mod maceopt;
mod schema;
mod xtb;
mod zeopp;

pub use client::BackendClient;
pub use maceopt::MaceOptAdapter;
pub use schema::{RouteSchema, RouteSchemas, SchemaError};
pub use xtb::XtbAdapter;
pub use zeopp::{classify_structure, StructureFormat, ZeoppAdapter};

use async_trait::async_trait;
use mcp_common::Parameters;
use serde_json::Value;
use thiserror::Error;

use crate::registry::RegistryError;
use crate::trace::TraceId;

/// Errors raised while building or performing a backend call.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Bad or missing parameters, or an unsupported route. Raised before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport failure, timeout, non-success status or undecodable body.
    #[error("Backend call error: {0}")]
    BackendCall(String),

    #[error("Backend lookup failed: {0}")]
    UnknownModel(#[from] RegistryError),

    #[error("Temporary file error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AdapterError::Validation(_))
    }
}

/// Everything an adapter needs to execute one job.
#[derive(Debug, Clone)]
pub struct AdapterJob {
    pub task_id: String,
    pub trace_id: TraceId,
    pub input: Value,
    pub parameters: Parameters,
}

/// Backend-specific shape of one outgoing call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    /// Sub-path appended to the backend base address, e.g. "/optimize".
    pub path: String,
    /// Multipart field carrying the structure file.
    pub file_field: &'static str,
    /// Suffix of the temporary structure file, e.g. ".xyz".
    pub file_suffix: &'static str,
    /// Structure file content.
    pub content: String,
    /// String-valued form fields, in the order they are sent.
    pub fields: Vec<(String, String)>,
}

#[cfg(test)]
impl BackendCall {
    /// Look up a form field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// One implementation per backend family.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Model key this adapter serves (e.g. "maceopt").
    fn model(&self) -> &'static str;

    /// Translate a job into this backend's wire contract. Performs no I/O.
    fn build_call(&self, job: &AdapterJob) -> Result<BackendCall, AdapterError>;

    /// Build and perform the backend call, returning the decoded response body.
    async fn call(&self, job: &AdapterJob) -> Result<Value, AdapterError>;
}

/// Render a parameter value as a form field.
///
/// Strings are sent verbatim, booleans as `true`/`false`, numbers in their
/// JSON form. `null` means "not provided".
pub(crate) fn form_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Forward `name` from the job parameters if it is present.
pub(crate) fn forward_if_present(
    parameters: &Parameters,
    name: &str,
    fields: &mut Vec<(String, String)>,
) {
    if let Some(value) = parameters.get(name).and_then(form_value) {
        fields.push((name.to_string(), value));
    }
}

/// Text written to the temporary structure file.
pub(crate) fn render_input(input: &Value) -> String {
    match input {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
