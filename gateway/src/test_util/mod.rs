pub mod stub_adapters;

pub use stub_adapters::{EchoAdapter, FailingAdapter, GatedAdapter, PanickingAdapter};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use mcp_common::{JobStatus, Parameters};
use serde_json::Value;

use crate::adapters::{AdapterJob, BackendClient, RouteSchema, RouteSchemas};
use crate::config::{BackendsConfig, Config};
use crate::queue::JobQueue;
use crate::registry::BackendRegistry;
use crate::trace::TraceId;

/// Configuration with every backend pointed at `backend_url` and a small worker pool.
pub fn test_config(backend_url: &str) -> Config {
    let mut config = Config::default();
    config.backends = BackendsConfig {
        maceopt: backend_url.to_string(),
        zeopp: backend_url.to_string(),
        xtb: backend_url.to_string(),
    };
    config.queue.workers = 2;
    config.queue.capacity = 16;
    config.adapters.call_timeout_secs = 5;
    config.logging.level = "debug".to_string();
    config
}

/// Client against the default backend addresses. Never reached by `build_call` tests.
pub fn test_client() -> Arc<BackendClient> {
    let registry = Arc::new(BackendRegistry::from_config(&BackendsConfig::default()));
    Arc::new(BackendClient::with_timeout(registry, Duration::from_secs(5), None).unwrap())
}

/// Two-route schema: `pore_diameter` (the default) and `surface_area`.
pub fn test_route_schemas() -> RouteSchemas {
    let schema = |required: &[&str], optional: &[&str]| RouteSchema {
        required: required.iter().map(|s| s.to_string()).collect(),
        optional: optional.iter().map(|s| s.to_string()).collect(),
    };

    let mut routes = BTreeMap::new();
    routes.insert("pore_diameter".to_string(), schema(&["output_filename"], &["ha"]));
    routes.insert(
        "surface_area".to_string(),
        schema(&["chan_radius", "probe_radius", "samples"], &["ha"]),
    );

    RouteSchemas::new(routes, "pore_diameter").unwrap()
}

/// Job with a string input and the given parameters object.
pub fn adapter_job(input: &str, parameters: Value) -> AdapterJob {
    let parameters: Parameters = match parameters {
        Value::Object(map) => map,
        _ => Parameters::new(),
    };

    AdapterJob {
        task_id: "task-1".to_string(),
        trace_id: TraceId::from("trace-1"),
        input: Value::String(input.to_string()),
        parameters,
    }
}

/// Poll until the job reaches a terminal status. Panics after five seconds.
pub async fn wait_for_status(queue: &JobQueue, task_id: &str) -> JobStatus {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let status = queue.status(task_id).await;
        if status.is_terminal() {
            return status;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("task {} still {:?} after 5s", task_id, status);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
