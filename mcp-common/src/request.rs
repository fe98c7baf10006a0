//! Job request envelope accepted by the gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend-specific parameters attached to a job.
///
/// Values are arbitrary JSON scalars; each backend adapter decides which keys
/// it understands and how they are rendered on the wire.
pub type Parameters = serde_json::Map<String, Value>;

/// A computation request submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    /// Structure content or other uploaded payload. Usually a string.
    pub input: Value,
    pub context: McpContext,
}

/// Routing and bookkeeping information for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpContext {
    /// Caller-supplied job identifier. Generated by the gateway when absent.
    #[serde(default)]
    pub task_id: Option<String>,
    /// Backend identifier, e.g. "maceopt", "zeopp" or "xtb" (case-insensitive).
    pub model: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub parameters: Parameters,
}

impl McpContext {
    /// Model key in the canonical lower-case form used for lookups.
    pub fn model_key(&self) -> String {
        self.model.trim().to_lowercase()
    }

    /// The caller-supplied task id, ignoring blank values.
    pub fn requested_task_id(&self) -> Option<&str> {
        self.task_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_request() {
        let json = r#"{
            "input": "24\nframe\nC 0.0 0.0 0.0",
            "context": { "model": "MACEOPT" }
        }"#;

        let request: McpRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.context.model_key(), "maceopt");
        assert!(request.context.task_id.is_none());
        assert!(request.context.user.is_none());
        assert!(request.context.parameters.is_empty());
        assert!(request.input.is_string());
    }

    #[test]
    fn test_request_with_parameters() {
        let json = r#"{
            "input": "data_test",
            "context": {
                "task_id": "job-1",
                "model": "zeopp",
                "user": "alice",
                "parameters": { "route": "surface_area", "probe_radius": 1.2, "ha": true }
            }
        }"#;

        let request: McpRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.context.requested_task_id(), Some("job-1"));
        assert_eq!(request.context.user.as_deref(), Some("alice"));
        assert_eq!(request.context.parameters["route"], "surface_area");
        assert_eq!(request.context.parameters["ha"], true);
    }

    #[test]
    fn test_blank_task_id_is_ignored() {
        let context = McpContext {
            task_id: Some("   ".to_string()),
            model: "xtb".to_string(),
            user: None,
            parameters: Parameters::new(),
        };
        assert_eq!(context.requested_task_id(), None);
    }
}
