//! List filters shared by storage backends and the HTTP query string.

use serde::Deserialize;
use uuid::Uuid;

use crate::admission::{AdmissionRequest, AdmissionStatus};
use crate::facility::{Bed, BedStatus, Room, Ward};
use crate::stay::{Stay, StayStatus};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WardFilter {
    pub active: Option<bool>,
}

impl WardFilter {
    pub fn matches(&self, ward: &Ward) -> bool {
        self.active.map_or(true, |a| ward.active == a)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomFilter {
    pub ward_id: Option<Uuid>,
    pub active: Option<bool>,
}

impl RoomFilter {
    pub fn matches(&self, room: &Room) -> bool {
        self.ward_id.map_or(true, |id| room.ward_id == id)
            && self.active.map_or(true, |a| room.active == a)
    }
}

/// Bed listing filter. `ward_id` is resolved through the bed's room.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BedFilter {
    pub room_id: Option<Uuid>,
    pub ward_id: Option<Uuid>,
    pub status: Option<BedStatus>,
}

impl BedFilter {
    /// `room_ward` is the ward of the bed's room, when known.
    pub fn matches(&self, bed: &Bed, room_ward: Option<Uuid>) -> bool {
        self.room_id.map_or(true, |id| bed.room_id == id)
            && self.status.map_or(true, |s| bed.status == s)
            && self.ward_id.map_or(true, |id| room_ward == Some(id))
    }
}

/// Admission queue filter. An absent status means `pending`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdmissionFilter {
    pub status: Option<AdmissionStatus>,
    /// Include every status; overrides `status`.
    #[serde(default)]
    pub all: bool,
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

impl AdmissionFilter {
    pub fn effective_status(&self) -> Option<AdmissionStatus> {
        if self.all {
            None
        } else {
            Some(self.status.unwrap_or(AdmissionStatus::Pending))
        }
    }

    pub fn matches(&self, request: &AdmissionRequest) -> bool {
        self.effective_status().map_or(true, |s| request.status == s)
            && self.doctor_id.map_or(true, |id| request.doctor_id == id)
            && self.patient_id.map_or(true, |id| request.patient_id == id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StayFilter {
    pub status: Option<StayStatus>,
    /// `true` keeps non-terminal stays, `false` keeps discharged ones.
    pub active: Option<bool>,
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub ward_id: Option<Uuid>,
}

impl StayFilter {
    pub fn matches(&self, stay: &Stay) -> bool {
        self.status.map_or(true, |s| stay.status == s)
            && self.active.map_or(true, |a| stay.is_active() == a)
            && self.doctor_id.map_or(true, |id| stay.doctor_id == id)
            && self.patient_id.map_or(true, |id| stay.patient_id == id)
            && self.ward_id.map_or(true, |id| stay.ward_id == id)
    }
}
