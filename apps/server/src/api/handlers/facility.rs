//! Ward, room and bed handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use uuid::Uuid;
use wardflow_models::{
    BedFilter, BedUpdate, NewBed, NewRoom, NewWard, RoomFilter, RoomUpdate, WardFilter,
    WardUpdate,
};

use crate::{
    api::extractors::{JsonBody, PathParams, QueryParams},
    auth::Actor,
    state::AppState,
    Result,
};

// Wards

pub async fn create_ward(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(input): JsonBody<NewWard>,
) -> Result<impl IntoResponse> {
    let ward = state.facility.create_ward(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(ward)))
}

pub async fn list_wards(
    State(state): State<AppState>,
    _actor: Actor,
    QueryParams(filter): QueryParams<WardFilter>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.facility.list_wards(&filter).await?))
}

pub async fn get_ward(
    State(state): State<AppState>,
    _actor: Actor,
    PathParams(ward_id): PathParams<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.facility.get_ward(ward_id).await?))
}

pub async fn update_ward(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(ward_id): PathParams<Uuid>,
    JsonBody(update): JsonBody<WardUpdate>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.facility.update_ward(&actor, ward_id, update).await?))
}

pub async fn delete_ward(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(ward_id): PathParams<Uuid>,
) -> Result<impl IntoResponse> {
    state.facility.delete_ward(&actor, ward_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Rooms

pub async fn create_room(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(ward_id): PathParams<Uuid>,
    JsonBody(input): JsonBody<NewRoom>,
) -> Result<impl IntoResponse> {
    let room = state.facility.create_room(&actor, ward_id, input).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn list_rooms(
    State(state): State<AppState>,
    _actor: Actor,
    PathParams(ward_id): PathParams<Uuid>,
    QueryParams(filter): QueryParams<RoomFilter>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.facility.list_rooms(ward_id, &filter).await?))
}

pub async fn get_room(
    State(state): State<AppState>,
    _actor: Actor,
    PathParams(room_id): PathParams<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.facility.get_room(room_id).await?))
}

pub async fn update_room(
    State(state): State<AppState>,
    actor: Actor,
    PathParams((ward_id, room_id)): PathParams<(Uuid, Uuid)>,
    JsonBody(update): JsonBody<RoomUpdate>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state
            .facility
            .update_room(&actor, ward_id, room_id, update)
            .await?,
    ))
}

pub async fn delete_room(
    State(state): State<AppState>,
    actor: Actor,
    PathParams((ward_id, room_id)): PathParams<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    state.facility.delete_room(&actor, ward_id, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Beds

pub async fn create_bed(
    State(state): State<AppState>,
    actor: Actor,
    PathParams(room_id): PathParams<Uuid>,
    JsonBody(input): JsonBody<NewBed>,
) -> Result<impl IntoResponse> {
    let bed = state.facility.create_bed(&actor, room_id, input).await?;
    Ok((StatusCode::CREATED, Json(bed)))
}

pub async fn list_room_beds(
    State(state): State<AppState>,
    _actor: Actor,
    PathParams(room_id): PathParams<Uuid>,
    QueryParams(filter): QueryParams<BedFilter>,
) -> Result<impl IntoResponse> {
    // The room must exist even when it has no beds.
    state.facility.get_room(room_id).await?;
    let filter = BedFilter {
        room_id: Some(room_id),
        ..filter
    };
    Ok(Json(state.facility.list_beds(&filter).await?))
}

/// `GET /beds?ward_id=&room_id=&status=`
pub async fn list_beds(
    State(state): State<AppState>,
    _actor: Actor,
    QueryParams(filter): QueryParams<BedFilter>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.facility.list_beds(&filter).await?))
}

pub async fn get_bed(
    State(state): State<AppState>,
    _actor: Actor,
    PathParams(bed_id): PathParams<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.facility.get_bed(bed_id).await?))
}

pub async fn update_bed(
    State(state): State<AppState>,
    actor: Actor,
    PathParams((room_id, bed_id)): PathParams<(Uuid, Uuid)>,
    JsonBody(update): JsonBody<BedUpdate>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state
            .facility
            .update_bed(&actor, room_id, bed_id, update)
            .await?,
    ))
}

pub async fn delete_bed(
    State(state): State<AppState>,
    actor: Actor,
    PathParams((room_id, bed_id)): PathParams<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    state.facility.delete_bed(&actor, room_id, bed_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
