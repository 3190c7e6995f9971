//! Business logic layer
//!
//! Each public operation opens one store transaction, performs its reads, checks and
//! writes inside it, and commits. Any early return drops the transaction, which rolls
//! it back.

pub mod admission;
pub mod facility;
pub mod metrics;
pub mod notes;
pub mod occupancy;
pub mod stay;

pub use admission::{AdmissionService, Approval};
pub use facility::FacilityService;
pub use metrics::MetricsService;
pub use notes::NoteService;
pub use occupancy::OccupancyService;
pub use stay::{StayDetail, StayService};

use uuid::Uuid;
use wardflow_models::{Bed, BedAssignment};

use crate::db::StoreTransaction;
use crate::{Error, Result};

/// Confirms that `bed` sits in `placement.room_id` inside `placement.ward_id`, and
/// that both the room and the ward accept patients.
pub(crate) async fn verify_placement(
    tx: &mut dyn StoreTransaction,
    placement: &BedAssignment,
    bed: &Bed,
) -> Result<()> {
    if bed.room_id != placement.room_id {
        return Err(Error::Validation(format!(
            "bed {} is not in room {}",
            bed.id, placement.room_id
        )));
    }
    let room = tx
        .get_room(placement.room_id)
        .await?
        .ok_or_else(|| Error::not_found("room", placement.room_id))?;
    if room.ward_id != placement.ward_id {
        return Err(Error::Validation(format!(
            "room {} is not in ward {}",
            room.id, placement.ward_id
        )));
    }
    let ward = tx
        .get_ward(placement.ward_id)
        .await?
        .ok_or_else(|| Error::not_found("ward", placement.ward_id))?;
    if !room.active || !ward.active {
        return Err(Error::InvalidState(format!(
            "room {} in ward '{}' is not accepting patients",
            room.room_number, ward.name
        )));
    }
    Ok(())
}

/// Maps a storage uniqueness violation on a stay row to the lost-race error.
pub(crate) fn stay_conflict(err: Error, bed_id: Uuid) -> Error {
    if err.is_unique_violation() {
        Error::InvalidState(format!("bed {bed_id} or the patient already has an active stay"))
    } else {
        err
    }
}
