//! Service info and health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::db::TxMode;
use crate::state::AppState;

/// Reports `degraded` with 503 when the store cannot open a transaction.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.store.backend_name();
    match state.store.begin(TxMode::Snapshot).await {
        Ok(tx) => {
            if let Err(e) = tx.rollback().await {
                tracing::warn!(error = %e, "Health check rollback failed");
            }
            (
                StatusCode::OK,
                Json(json!({ "status": "ok", "service": "wardflow", "store": backend })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, backend, "Health check could not reach the store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "service": "wardflow", "store": backend })),
            )
        }
    }
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "server": "wardflow",
        "description": "Inpatient admission and bed allocation",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.store.backend_name(),
        "api": "/api/v1",
    }))
}
