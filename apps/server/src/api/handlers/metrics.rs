//! Prometheus scrape endpoint

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};

use crate::state::AppState;

/// Occupancy and pool gauges are refreshed before the registry is gathered.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let server_info = state
        .metrics_service
        .collect_custom_metrics(env!("CARGO_PKG_VERSION"), state.store.backend_name())
        .await;

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
    }
    buffer.extend_from_slice(server_info.as_bytes());

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
