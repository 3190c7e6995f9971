//! Allocation API routes, nested under `/api/v1`

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::api::handlers::{admissions, facility, occupancy, stays};
use crate::state::AppState;

pub fn allocation_routes() -> Router<AppState> {
    Router::new()
        // Facility registry
        .route(
            "/wards",
            get(facility::list_wards).post(facility::create_ward),
        )
        .route(
            "/wards/:ward_id",
            get(facility::get_ward)
                .patch(facility::update_ward)
                .delete(facility::delete_ward),
        )
        .route(
            "/wards/:ward_id/rooms",
            get(facility::list_rooms).post(facility::create_room),
        )
        .route(
            "/wards/:ward_id/rooms/:room_id",
            patch(facility::update_room).delete(facility::delete_room),
        )
        .route("/rooms/:room_id", get(facility::get_room))
        .route(
            "/rooms/:room_id/beds",
            get(facility::list_room_beds).post(facility::create_bed),
        )
        .route(
            "/rooms/:room_id/beds/:bed_id",
            patch(facility::update_bed).delete(facility::delete_bed),
        )
        .route("/beds", get(facility::list_beds))
        .route("/beds/:bed_id", get(facility::get_bed))
        // Occupancy
        .route("/occupancy", get(occupancy::facility_occupancy))
        .route("/occupancy/wards/:ward_id", get(occupancy::ward_occupancy))
        // Admission workflow
        .route(
            "/admissions",
            get(admissions::list).post(admissions::submit),
        )
        .route("/admissions/:request_id", get(admissions::get))
        .route("/admissions/:request_id/approve", post(admissions::approve))
        .route("/admissions/:request_id/reject", post(admissions::reject))
        // Stays
        .route("/stays", get(stays::list))
        .route("/stays/:stay_id", get(stays::get))
        .route("/stays/:stay_id/begin-care", post(stays::begin_care))
        .route("/stays/:stay_id/transfer", post(stays::request_transfer))
        .route(
            "/stays/:stay_id/transfer/complete",
            post(stays::complete_transfer),
        )
        .route(
            "/stays/:stay_id/transfer/cancel",
            post(stays::cancel_transfer),
        )
        .route("/stays/:stay_id/discharge", post(stays::request_discharge))
        .route(
            "/stays/:stay_id/discharge/approve",
            post(stays::approve_discharge),
        )
        .route(
            "/stays/:stay_id/treatment-plan",
            put(stays::update_treatment_plan),
        )
        .route(
            "/stays/:stay_id/notes",
            get(stays::list_notes).post(stays::add_note),
        )
}
