//! Admission request handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use uuid::Uuid;
use wardflow_models::{AdmissionFilter, BedAssignment, RejectAdmission, SubmitAdmission};

use crate::{
    api::extractors::{JsonBody, PathParams, QueryParams},
    auth::Actor,
    state::AppState,
    Result,
};

pub async fn submit(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(input): JsonBody<SubmitAdmission>,
) -> Result<impl IntoResponse> {
    let request = state.admissions.submit(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Triage queue; pending requests unless `status` or `all=true` is given.
pub async fn list(
    State(state): State<AppState>,
    _actor: Actor,
    QueryParams(filter): QueryParams<AdmissionFilter>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.admissions.list(&filter).await?))
}

pub async fn get(
    State(state): State<AppState>,
    _actor: Actor,
    PathParams(request_id): PathParams<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.admissions.get(request_id).await?))
}

pub async fn approve(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(request_id): PathParams<Uuid>,
    JsonBody(placement): JsonBody<BedAssignment>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state
            .admissions
            .approve(&actor, request_id, placement)
            .await?,
    ))
}

pub async fn reject(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(request_id): PathParams<Uuid>,
    JsonBody(input): JsonBody<RejectAdmission>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.admissions.reject(&actor, request_id, input).await?))
}
