//! Shared multipart sender used by every backend adapter.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde_json::Value;
use tempfile::NamedTempFile;

use super::{AdapterError, BackendCall};
use crate::config::AdaptersConfig;
use crate::registry::BackendRegistry;
use crate::trace::{TraceId, TRACE_HEADER};

/// Performs backend calls: stages the structure file, uploads it and
/// normalizes the response.
pub struct BackendClient {
    http_client: Client,
    registry: Arc<BackendRegistry>,
    scratch_dir: Option<PathBuf>,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(
        registry: Arc<BackendRegistry>,
        config: &AdaptersConfig,
    ) -> Result<Self, reqwest::Error> {
        Self::with_timeout(
            registry,
            Duration::from_secs(config.call_timeout_secs),
            config.scratch_dir.clone(),
        )
    }

    pub fn with_timeout(
        registry: Arc<BackendRegistry>,
        timeout: Duration,
        scratch_dir: Option<PathBuf>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            registry,
            scratch_dir,
            timeout,
        })
    }

    /// Upload `call` to the backend registered for `model`.
    ///
    /// The structure file is streamed from a temporary file that lives until
    /// the response has been read and is removed on every return path.
    pub async fn send(
        &self,
        model: &str,
        call: BackendCall,
        trace_id: &TraceId,
    ) -> Result<Value, AdapterError> {
        let base_url = self.registry.resolve(model)?;
        let url = format!("{}{}", base_url, call.path);

        let staged = self.stage(&call)?;
        let file_name = staged
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("structure{}", call.file_suffix));
        let length = staged.as_file().metadata()?.len();
        let upload = tokio::fs::File::from_std(staged.reopen()?);

        let part = Part::stream_with_length(Body::from(upload), length)
            .file_name(file_name)
            .mime_str("text/plain")
            .map_err(|e| AdapterError::BackendCall(e.to_string()))?;
        let form = call
            .fields
            .into_iter()
            .fold(Form::new().part(call.file_field, part), |form, (key, value)| {
                form.text(key, value)
            });

        tracing::info!("[{}] Dispatching to {}", model, url);

        let response = self
            .http_client
            .post(&url)
            .header(TRACE_HEADER, trace_id.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::BackendCall(format!(
                        "[{}] request to {} timed out after {:?}",
                        model, url, self.timeout
                    ))
                } else {
                    AdapterError::BackendCall(format!("[{}] request to {} failed: {}", model, url, e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::BackendCall(format!(
                "[{}] backend error [{}]: {}",
                model, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AdapterError::BackendCall(format!("[{}] invalid response: {}", model, e)))
    }

    /// Write the structure content to a fresh temporary file.
    fn stage(&self, call: &BackendCall) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("mcp-").suffix(call.file_suffix);

        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(call.content.as_bytes())?;
        file.flush()?;

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn optimize_call() -> BackendCall {
        BackendCall {
            path: "/optimize".to_string(),
            file_field: "structure_file",
            file_suffix: ".xyz",
            content: "1\nhydrogen\nH 0.0 0.0 0.0\n".to_string(),
            fields: vec![("fmax".to_string(), "0.05".to_string())],
        }
    }

    fn client_for(base_url: &str, scratch: &tempfile::TempDir) -> BackendClient {
        let registry = Arc::new(BackendRegistry::from_entries([("maceopt", base_url)]));
        BackendClient::with_timeout(
            registry,
            Duration::from_secs(5),
            Some(scratch.path().to_path_buf()),
        )
        .unwrap()
    }

    fn scratch_entries(scratch: &tempfile::TempDir) -> usize {
        std::fs::read_dir(scratch.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_success_returns_json_and_removes_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/optimize"))
            .and(header(TRACE_HEADER, "trace-1"))
            .and(body_string_contains("name=\"structure_file\""))
            .and(body_string_contains("name=\"fmax\""))
            .and(body_string_contains("H 0.0 0.0 0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "energy": -13.6 })))
            .expect(1)
            .mount(&server)
            .await;

        let scratch = tempfile::tempdir().unwrap();
        let client = client_for(&server.uri(), &scratch);

        let result = client
            .send("maceopt", optimize_call(), &TraceId::from("trace-1"))
            .await
            .unwrap();

        assert_eq!(result, json!({ "energy": -13.6 }));
        assert_eq!(scratch_entries(&scratch), 0);
    }

    #[tokio::test]
    async fn test_large_structure_is_streamed_whole() {
        let mut content = String::from("4000\nlarge cell\n");
        for i in 0..4000 {
            content.push_str(&format!("C {}.0 0.0 0.0\n", i));
        }

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/optimize"))
            .and(body_string_contains("large cell"))
            .and(body_string_contains("C 3999.0 0.0 0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "atoms": 4000 })))
            .expect(1)
            .mount(&server)
            .await;

        let scratch = tempfile::tempdir().unwrap();
        let client = client_for(&server.uri(), &scratch);
        let call = BackendCall {
            content,
            ..optimize_call()
        };

        let result = client
            .send("maceopt", call, &TraceId::generate())
            .await
            .unwrap();

        assert_eq!(result, json!({ "atoms": 4000 }));
        assert_eq!(scratch_entries(&scratch), 0);
    }

    #[tokio::test]
    async fn test_error_status_keeps_body_and_removes_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/optimize"))
            .respond_with(ResponseTemplate::new(500).set_body_string("optimizer diverged"))
            .mount(&server)
            .await;

        let scratch = tempfile::tempdir().unwrap();
        let client = client_for(&server.uri(), &scratch);

        let err = client
            .send("maceopt", optimize_call(), &TraceId::generate())
            .await
            .unwrap_err();

        assert!(matches!(err, AdapterError::BackendCall(_)));
        assert!(err.to_string().contains("optimizer diverged"));
        assert!(err.to_string().contains("500"));
        assert_eq!(scratch_entries(&scratch), 0);
    }

    #[tokio::test]
    async fn test_transport_error_removes_file() {
        let scratch = tempfile::tempdir().unwrap();
        // Nothing listens on port 1.
        let client = client_for("http://127.0.0.1:1", &scratch);

        let err = client
            .send("maceopt", optimize_call(), &TraceId::generate())
            .await
            .unwrap_err();

        assert!(matches!(err, AdapterError::BackendCall(_)));
        assert_eq!(scratch_entries(&scratch), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_a_backend_call_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let scratch = tempfile::tempdir().unwrap();
        let registry = Arc::new(BackendRegistry::from_entries([("maceopt", server.uri())]));
        let client = BackendClient::with_timeout(
            registry,
            Duration::from_millis(200),
            Some(scratch.path().to_path_buf()),
        )
        .unwrap();

        let err = client
            .send("maceopt", optimize_call(), &TraceId::generate())
            .await
            .unwrap_err();

        assert!(matches!(err, AdapterError::BackendCall(_)));
        assert_eq!(scratch_entries(&scratch), 0);
    }

    #[tokio::test]
    async fn test_unknown_model_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let scratch = tempfile::tempdir().unwrap();
        let client = client_for(&server.uri(), &scratch);

        let err = client
            .send("gaussian", optimize_call(), &TraceId::generate())
            .await
            .unwrap_err();

        assert!(matches!(err, AdapterError::UnknownModel(_)));
        assert_eq!(scratch_entries(&scratch), 0);
    }
}
