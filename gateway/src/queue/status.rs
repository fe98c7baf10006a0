//! Caller-visible status projection over job records.

use mcp_common::{JobState, JobStatus};
use serde_json::Value;

use super::store::JobRecord;

/// Map a job record (or its absence) to the status reported to callers.
///
/// A succeeded record whose payload itself reports a failure is surfaced as
/// a failed job: callers only see one outcome.
pub fn job_status(record: Option<&JobRecord>) -> JobStatus {
    let Some(record) = record else {
        return JobStatus::NotSubmitted;
    };

    match record.state {
        JobState::Pending => JobStatus::Pending,
        JobState::Running => JobStatus::Running,
        JobState::Failed => JobStatus::Failed(
            record
                .error
                .clone()
                .unwrap_or_else(|| "Job failed".to_string()),
        ),
        JobState::Succeeded => {
            let payload = record.result.clone().unwrap_or(Value::Null);
            match inner_failure(&payload) {
                Some(message) => JobStatus::Failed(message),
                None => JobStatus::Succeeded(payload),
            }
        }
    }
}

/// Failure message carried by a payload shaped like `{"status": "FAILED", ...}`.
fn inner_failure(payload: &Value) -> Option<String> {
    let status = payload.get("status")?.as_str()?;
    if !status.eq_ignore_ascii_case("failed") {
        return None;
    }

    let message = ["message", "error", "detail"]
        .iter()
        .find_map(|key| match payload.get(*key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_else(|| "Backend reported failure".to_string());

    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceId;
    use serde_json::json;

    fn record(state: JobState, result: Option<Value>, error: Option<&str>) -> JobRecord {
        let mut record =
            JobRecord::pending("job-1".to_string(), "zeopp".to_string(), None, TraceId::from("t"));
        record.state = state;
        record.result = result;
        record.error = error.map(String::from);
        record
    }

    #[test]
    fn test_unknown_id_is_not_pending() {
        assert_eq!(job_status(None), JobStatus::NotSubmitted);
    }

    #[test]
    fn test_non_terminal_states() {
        assert_eq!(job_status(Some(&record(JobState::Pending, None, None))), JobStatus::Pending);
        assert_eq!(job_status(Some(&record(JobState::Running, None, None))), JobStatus::Running);
    }

    #[test]
    fn test_success_payload_passes_through() {
        let payload = json!({ "status": "success", "largest_included_sphere": 15.1 });
        let status = job_status(Some(&record(JobState::Succeeded, Some(payload.clone()), None)));
        assert_eq!(status, JobStatus::Succeeded(payload));
    }

    #[test]
    fn test_failed_record_keeps_error() {
        let status = job_status(Some(&record(JobState::Failed, None, Some("timeout"))));
        assert_eq!(status, JobStatus::Failed("timeout".to_string()));
    }

    #[test]
    fn test_inner_failure_marker_collapses_to_failed() {
        let payload = json!({ "task_id": "job-1", "status": "FAILED", "message": "bad cell" });
        let status = job_status(Some(&record(JobState::Succeeded, Some(payload), None)));
        assert_eq!(status, JobStatus::Failed("bad cell".to_string()));
    }

    #[test]
    fn test_inner_failure_without_message() {
        let payload = json!({ "status": "failed", "detail": { "code": 7 } });
        let status = job_status(Some(&record(JobState::Succeeded, Some(payload), None)));
        assert_eq!(status, JobStatus::Failed(r#"{"code":7}"#.to_string()));

        let bare = json!({ "status": "Failed" });
        let status = job_status(Some(&record(JobState::Succeeded, Some(bare), None)));
        assert_eq!(status, JobStatus::Failed("Backend reported failure".to_string()));
    }
}
