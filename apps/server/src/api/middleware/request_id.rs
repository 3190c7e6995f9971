//! Request ID middleware with OpenTelemetry trace context injection

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use opentelemetry::trace::TraceContextExt;
use std::time::Instant;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

use crate::request_context::RequestContext;

const REQUEST_ID_HEADER: &str = "x-request-id";
const TRACE_ID_HEADER: &str = "x-trace-id";
const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Creates the root `http_request` span for each request.
///
/// The server always assigns its own `x-request-id`; a different id sent by the
/// client comes back as `x-correlation-id`. The trace id is returned in `x-trace-id`.
/// The actor extractor fills in `actor.role` once the handler runs.
#[tracing::instrument(
    name = "http_request",
    skip_all,
    fields(
        http.method = %req.method(),
        http.route = %crate::metrics::sanitize_path(req.uri().path()),
        otel.kind = "server",
        http.response.status_code = tracing::field::Empty,
        actor.role = tracing::field::Empty,
        request_id = tracing::field::Empty,
    )
)]
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let current_span = Span::current();
    let start = Instant::now();

    let client_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let server_id = Uuid::new_v4().to_string();
    current_span.record("request_id", &server_id);
    req.extensions_mut().insert(RequestContext {
        request_id: server_id.clone(),
    });

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;

    let status = response.status();
    current_span.record("http.response.status_code", status.as_u16());
    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    let trace_id = current_span
        .context()
        .span()
        .span_context()
        .trace_id()
        .to_string();
    let correlation_id = client_id.filter(|id| *id != server_id);

    let headers = response.headers_mut();
    for (name, value) in [
        (REQUEST_ID_HEADER, Some(server_id)),
        (TRACE_ID_HEADER, Some(trace_id)),
        (CORRELATION_ID_HEADER, correlation_id),
    ] {
        if let Some(value) = value.and_then(|v| HeaderValue::from_str(&v).ok()) {
            headers.insert(name, value);
        }
    }

    response
}
