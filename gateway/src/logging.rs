use std::time::Instant;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use crate::trace::{TraceId, TRACE_HEADER};

/// Middleware that attaches a trace id to the request and logs it at INFO level.
///
/// The id comes from the inbound `x-trace-id` header or is generated, is made
/// available to handlers as an `Extension<TraceId>` and echoed on the response.
pub async fn request_logger(mut request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let trace_id = TraceId::from_headers(request.headers());
    request.extensions_mut().insert(trace_id.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response.headers_mut().insert(TRACE_HEADER, value);
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        trace_id = %trace_id,
        "HTTP request"
    );

    response
}
