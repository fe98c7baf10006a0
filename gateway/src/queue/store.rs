//! In-memory job record store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mcp_common::JobState;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::trace::TraceId;

/// Tracked state of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub task_id: String,
    pub model: String,
    pub user: Option<String>,
    pub trace_id: TraceId,
    pub state: JobState,
    /// Backend payload, set only when `state` is `Succeeded`.
    pub result: Option<Value>,
    /// Failure description, set only when `state` is `Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn pending(task_id: String, model: String, user: Option<String>, trace_id: TraceId) -> Self {
        Self {
            task_id,
            model,
            user,
            trace_id,
            state: JobState::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}

/// Terminal outcome of a job as reported by its worker.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded(Value),
    Failed(String),
}

/// Job records keyed by task id.
///
/// Transitions are only applied from the expected predecessor state, so a
/// record never leaves a terminal state.
#[derive(Debug, Default)]
pub struct JobStore {
    records: RwLock<HashMap<String, JobRecord>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a new pending record. Returns false if the id is already taken.
    pub async fn insert(&self, record: JobRecord) -> bool {
        let mut records = self.records.write().await;
        if records.contains_key(&record.task_id) {
            return false;
        }
        records.insert(record.task_id.clone(), record);
        true
    }

    pub async fn contains(&self, task_id: &str) -> bool {
        self.records.read().await.contains_key(task_id)
    }

    /// Snapshot of a record.
    pub async fn get(&self, task_id: &str) -> Option<JobRecord> {
        self.records.read().await.get(task_id).cloned()
    }

    /// `Pending → Running`.
    pub async fn mark_running(&self, task_id: &str) -> bool {
        let mut records = self.records.write().await;
        match records.get_mut(task_id) {
            Some(record) if record.state == JobState::Pending => {
                record.state = JobState::Running;
                record.started_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    /// `Running → Succeeded | Failed`.
    pub async fn finish(&self, task_id: &str, outcome: JobOutcome) -> bool {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(task_id) else {
            return false;
        };
        if record.state != JobState::Running {
            return false;
        }

        match outcome {
            JobOutcome::Succeeded(payload) => {
                record.state = JobState::Succeeded;
                record.result = Some(payload);
            }
            JobOutcome::Failed(error) => {
                record.state = JobState::Failed;
                record.error = Some(error);
            }
        }
        record.finished_at = Some(Utc::now());
        true
    }

    /// Number of records per state.
    pub async fn counts(&self) -> HashMap<JobState, usize> {
        let records = self.records.read().await;
        let mut counts = HashMap::new();
        for record in records.values() {
            *counts.entry(record.state).or_insert(0) += 1;
        }
        counts
    }

    /// Remove terminal records that finished more than `ttl_secs` ago.
    pub async fn remove_expired(&self, ttl_secs: i64) -> Vec<String> {
        let now = Utc::now();
        let mut removed = vec![];
        let mut records = self.records.write().await;

        records.retain(|id, record| {
            let expired = record.state.is_terminal()
                && record
                    .finished_at
                    .is_some_and(|at| (now - at).num_seconds() > ttl_secs);
            if expired {
                removed.push(id.clone());
            }
            !expired
        });

        removed
    }
}
