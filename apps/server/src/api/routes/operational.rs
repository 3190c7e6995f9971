//! Unversioned operational endpoints: liveness, service info and Prometheus scrape

use crate::api::handlers::{metrics, system};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn operational_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health_check))
        .route("/metrics", get(metrics::metrics_handler))
}
