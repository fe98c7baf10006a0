//! Correlation identifiers threaded through dispatch and job execution.

use std::fmt;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Header carrying the correlation id, inbound and towards backends.
pub const TRACE_HEADER: &str = "x-trace-id";

/// Correlation id for one submitted request.
///
/// Passed explicitly from the HTTP layer to the dispatcher, stored with the
/// queued job and forwarded to the backend call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

impl TraceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Take the caller's trace id from the request headers, or generate one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(TRACE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TraceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_value_is_reused() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACE_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(TraceId::from_headers(&headers).as_str(), "abc-123");
    }

    #[test]
    fn test_missing_or_blank_header_generates_id() {
        let generated = TraceId::from_headers(&HeaderMap::new());
        assert!(uuid::Uuid::parse_str(generated.as_str()).is_ok());

        let mut headers = HeaderMap::new();
        headers.insert(TRACE_HEADER, HeaderValue::from_static("  "));
        assert_ne!(TraceId::from_headers(&headers).as_str().trim(), "");
    }
}
