//! Job states and the payloads returned when submitting or polling a job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of a job record.
///
/// `Pending → Running → {Succeeded | Failed}`. The last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Enqueued, not yet picked up by a worker.
    Pending,
    /// A worker is executing the backend call.
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-visible status of a job identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// No job with this identifier was ever enqueued (or it has expired).
    NotSubmitted,
    Pending,
    Running,
    /// Backend payload of a job whose outcome succeeded.
    Succeeded(Value),
    /// Human-readable failure description.
    Failed(String),
}

impl JobStatus {
    /// Status token used on the wire.
    pub fn wire_status(&self) -> &'static str {
        match self {
            JobStatus::NotSubmitted => "NOT_FOUND",
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "IN_PROGRESS",
            JobStatus::Succeeded(_) => "COMPLETED",
            JobStatus::Failed(_) => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded(_) | JobStatus::Failed(_))
    }
}

/// Response returned when a job is submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub task_id: String,
    #[serde(default = "default_submit_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_submit_status() -> String {
    JobStatus::Pending.wire_status().to_string()
}

impl McpResponse {
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: default_submit_status(),
            message: None,
        }
    }
}

/// Response returned when polling a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    pub task_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultResponse {
    pub fn new(task_id: impl Into<String>, status: &JobStatus) -> Self {
        let (result, error) = match status {
            JobStatus::Succeeded(payload) => (Some(payload.clone()), None),
            JobStatus::Failed(message) => (None, Some(message.clone())),
            _ => (None, None),
        };

        Self {
            task_id: task_id.into(),
            status: status.wire_status().to_string(),
            result,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn test_job_state_serialization() {
        assert_eq!(serde_json::to_string(&JobState::Running).unwrap(), r#""running""#);
        let parsed: JobState = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(parsed, JobState::Failed);
    }

    #[test]
    fn test_result_response_for_pending_has_no_payload() {
        let response = ResultResponse::new("job-1", &JobStatus::Pending);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, json!({ "task_id": "job-1", "status": "PENDING" }));
    }

    #[test]
    fn test_result_response_for_running() {
        let response = ResultResponse::new("job-1", &JobStatus::Running);
        assert_eq!(response.status, "IN_PROGRESS");
    }

    #[test]
    fn test_result_response_for_success_and_failure() {
        let ok = ResultResponse::new("job-1", &JobStatus::Succeeded(json!({ "energy": -1.5 })));
        assert_eq!(ok.status, "COMPLETED");
        assert_eq!(ok.result, Some(json!({ "energy": -1.5 })));
        assert!(ok.error.is_none());

        let failed = ResultResponse::new("job-2", &JobStatus::Failed("boom".to_string()));
        assert_eq!(failed.status, "FAILED");
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.result.is_none());
    }

    #[test]
    fn test_submit_response_defaults_to_pending() {
        let response: McpResponse = serde_json::from_str(r#"{"task_id": "abc"}"#).unwrap();
        assert_eq!(response.status, "PENDING");
        assert_eq!(McpResponse::pending("abc").status, "PENDING");
    }
}
