//! Occupancy handlers

use axum::{extract::State, response::IntoResponse, Json};
use uuid::Uuid;

use crate::{api::extractors::PathParams, auth::Actor, state::AppState, Result};

pub async fn facility_occupancy(
    State(state): State<AppState>,
    _actor: Actor,
) -> Result<impl IntoResponse> {
    Ok(Json(state.occupancy.snapshot().await?))
}

pub async fn ward_occupancy(
    State(state): State<AppState>,
    _actor: Actor,
    PathParams(ward_id): PathParams<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.occupancy.ward(ward_id).await?))
}
