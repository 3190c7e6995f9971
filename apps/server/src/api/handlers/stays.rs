//! Stay and daily note handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use uuid::Uuid;
use wardflow_models::{
    BedAssignment, CancelTransfer, NewNote, NoteOrder, RequestDischarge, RequestTransfer,
    StayFilter, TreatmentPlanUpdate,
};

use crate::{
    api::extractors::{JsonBody, PathParams, QueryParams},
    auth::Actor,
    state::AppState,
    Result,
};

pub async fn list(
    State(state): State<AppState>,
    _actor: Actor,
    QueryParams(filter): QueryParams<StayFilter>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.stays.list(&filter).await?))
}

/// Stay detail including its notes.
pub async fn get(
    State(state): State<AppState>,
    _actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.stays.get(stay_id).await?))
}

pub async fn begin_care(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.stays.begin_care(&actor, stay_id).await?))
}

pub async fn request_transfer(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
    JsonBody(input): JsonBody<RequestTransfer>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state.stays.request_transfer(&actor, stay_id, input).await?,
    ))
}

pub async fn complete_transfer(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
    JsonBody(placement): JsonBody<BedAssignment>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state
            .stays
            .complete_transfer(&actor, stay_id, placement)
            .await?,
    ))
}

pub async fn cancel_transfer(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
    JsonBody(input): JsonBody<CancelTransfer>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.stays.cancel_transfer(&actor, stay_id, input).await?))
}

pub async fn request_discharge(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
    JsonBody(input): JsonBody<RequestDischarge>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state.stays.request_discharge(&actor, stay_id, input).await?,
    ))
}

pub async fn approve_discharge(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.stays.approve_discharge(&actor, stay_id).await?))
}

pub async fn update_treatment_plan(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
    JsonBody(input): JsonBody<TreatmentPlanUpdate>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state
            .stays
            .update_treatment_plan(&actor, stay_id, input)
            .await?,
    ))
}

pub async fn add_note(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
    JsonBody(input): JsonBody<NewNote>,
) -> Result<impl IntoResponse> {
    let note = state.notes.add_note(&actor, stay_id, input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

#[derive(Debug, Default, Deserialize)]
pub struct NotesQuery {
    #[serde(default)]
    pub order: NoteOrder,
}

pub async fn list_notes(
    State(state): State<AppState>,
    _actor: Actor,
    PathParams(stay_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<NotesQuery>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.notes.list_notes(stay_id, query.order).await?))
}
