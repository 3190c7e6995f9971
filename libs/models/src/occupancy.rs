//! Bed occupancy statistics
//!
//! Figures are derived from a set of beds at a single point in time and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::facility::{Bed, BedStatus, Room, Ward};

/// Wards at or above this occupancy percentage are critical.
pub const CRITICAL_THRESHOLD: f64 = 90.0;
/// Wards at or above this occupancy percentage raise a warning.
pub const WARNING_THRESHOLD: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    None,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn for_rate(rate: f64) -> Self {
        if rate >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if rate >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BedCounts {
    pub total_beds: u32,
    pub occupied_beds: u32,
    pub available_beds: u32,
    /// Percentage in `[0, 100]`; zero when the scope has no beds.
    pub occupancy_rate: f64,
}

impl BedCounts {
    pub fn from_beds<'a>(beds: impl IntoIterator<Item = &'a Bed>) -> Self {
        let mut counts = BedCounts::default();
        for bed in beds {
            counts.add(bed.status);
        }
        counts.finish()
    }

    fn add(&mut self, status: BedStatus) {
        self.total_beds += 1;
        match status {
            BedStatus::Occupied => self.occupied_beds += 1,
            BedStatus::Available => self.available_beds += 1,
            BedStatus::Reserved | BedStatus::Cleaning | BedStatus::Maintenance => {}
        }
    }

    fn finish(mut self) -> Self {
        self.occupancy_rate = occupancy_rate(self.occupied_beds, self.total_beds);
        self
    }
}

/// `occupied / total` as a percentage rounded to two decimals, `0` for an empty scope.
pub fn occupancy_rate(occupied: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = f64::from(occupied.min(total)) / f64::from(total) * 100.0;
    (rate * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomOccupancy {
    pub room_id: Uuid,
    pub room_number: String,
    #[serde(flatten)]
    pub counts: BedCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardOccupancy {
    pub ward_id: Uuid,
    pub name: String,
    /// Declared capacity, reported as-is next to the real bed count.
    pub declared_total_beds: Option<i32>,
    #[serde(flatten)]
    pub counts: BedCounts,
    pub alert: AlertLevel,
    pub rooms: Vec<RoomOccupancy>,
}

/// How the figures were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// Read from a single consistent snapshot at `computed_at`.
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    pub consistency: Consistency,
    pub computed_at: DateTime<Utc>,
    pub facility: BedCounts,
    pub current_patients: u64,
    pub wards: Vec<WardOccupancy>,
}

impl OccupancySnapshot {
    pub fn ward(&self, ward_id: Uuid) -> Option<&WardOccupancy> {
        self.wards.iter().find(|w| w.ward_id == ward_id)
    }
}

/// Aggregate beds into room, ward and facility figures.
///
/// Wards and rooms are reported in the order given. Beds whose room is not in
/// `rooms` still count towards the facility totals.
pub fn compute_snapshot(
    wards: &[Ward],
    rooms: &[Room],
    beds: &[Bed],
    current_patients: u64,
    computed_at: DateTime<Utc>,
) -> OccupancySnapshot {
    let mut beds_by_room: HashMap<Uuid, Vec<&Bed>> = HashMap::new();
    for bed in beds {
        beds_by_room.entry(bed.room_id).or_default().push(bed);
    }

    let ward_reports = wards
        .iter()
        .map(|ward| {
            let mut ward_counts = BedCounts::default();
            let room_reports: Vec<RoomOccupancy> = rooms
                .iter()
                .filter(|room| room.ward_id == ward.id)
                .map(|room| {
                    let room_beds = beds_by_room.get(&room.id).map(Vec::as_slice).unwrap_or(&[]);
                    for bed in room_beds {
                        ward_counts.add(bed.status);
                    }
                    RoomOccupancy {
                        room_id: room.id,
                        room_number: room.room_number.clone(),
                        counts: BedCounts::from_beds(room_beds.iter().copied()),
                    }
                })
                .collect();
            let counts = ward_counts.finish();
            WardOccupancy {
                ward_id: ward.id,
                name: ward.name.clone(),
                declared_total_beds: ward.total_beds,
                counts,
                alert: AlertLevel::for_rate(counts.occupancy_rate),
                rooms: room_reports,
            }
        })
        .collect();

    OccupancySnapshot {
        consistency: Consistency::Snapshot,
        computed_at,
        facility: BedCounts::from_beds(beds),
        current_patients,
        wards: ward_reports,
    }
}
