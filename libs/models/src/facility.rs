//! Wards, rooms and beds
//!
//! Facility entities are administrator-managed reference data. The only field with
//! lifecycle rules is [`Bed::status`]: staff edit it freely between the non-occupied
//! states, while `Occupied` belongs exclusively to the stay lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;
use crate::Error;

/// Top-level unit of inpatient care (e.g. "ICU").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Declared capacity. Informational only; never reconciled with the bed rows.
    pub total_beds: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Single,
    Double,
    Icu,
    Maternity,
    Pediatric,
    Emergency,
    General,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
            Self::Icu => "icu",
            Self::Maternity => "maternity",
            Self::Pediatric => "pediatric",
            Self::Emergency => "emergency",
            Self::General => "general",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            "icu" => Ok(Self::Icu),
            "maternity" => Ok(Self::Maternity),
            "pediatric" => Ok(Self::Pediatric),
            "emergency" => Ok(Self::Emergency),
            "general" => Ok(Self::General),
            other => Err(Error::UnknownVariant {
                kind: "room type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub ward_id: Uuid,
    /// Unique within the parent ward.
    pub room_number: String,
    pub room_type: RoomType,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedStatus {
    Available,
    Occupied,
    Reserved,
    Cleaning,
    Maintenance,
}

impl BedStatus {
    pub const ALL: [BedStatus; 5] = [
        BedStatus::Available,
        BedStatus::Occupied,
        BedStatus::Reserved,
        BedStatus::Cleaning,
        BedStatus::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::Cleaning => "cleaning",
            Self::Maintenance => "maintenance",
        }
    }

    /// Whether staff may set this status by editing the bed directly.
    pub fn is_staff_settable(&self) -> bool {
        !matches!(self, Self::Occupied)
    }
}

impl fmt::Display for BedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BedStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            "reserved" => Ok(Self::Reserved),
            "cleaning" => Ok(Self::Cleaning),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(Error::UnknownVariant {
                kind: "bed status",
                value: other.to_string(),
            }),
        }
    }
}

/// Smallest allocatable unit.
///
/// `status == Occupied` holds exactly when one non-terminal stay references the bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub id: Uuid,
    pub room_id: Uuid,
    /// Unique within the parent room.
    pub bed_number: String,
    pub status: BedStatus,
    pub updated_at: DateTime<Utc>,
}

impl Bed {
    pub fn is_available(&self) -> bool {
        self.status == BedStatus::Available
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewWard {
    #[validate(
        custom(function = "not_blank"),
        length(max = 120, message = "must be at most 120 characters")
    )]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub total_beds: Option<i32>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Partial ward update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct WardUpdate {
    #[validate(
        custom(function = "not_blank"),
        length(max = 120, message = "must be at most 120 characters")
    )]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub total_beds: Option<i32>,
    pub active: Option<bool>,
}

impl WardUpdate {
    pub fn apply(self, ward: &mut Ward) {
        if let Some(name) = self.name {
            ward.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            ward.description = Some(description);
        }
        if let Some(total_beds) = self.total_beds {
            ward.total_beds = Some(total_beds);
        }
        if let Some(active) = self.active {
            ward.active = active;
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRoom {
    #[validate(
        custom(function = "not_blank"),
        length(max = 32, message = "must be at most 32 characters")
    )]
    pub room_number: String,
    pub room_type: RoomType,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RoomUpdate {
    #[validate(
        custom(function = "not_blank"),
        length(max = 32, message = "must be at most 32 characters")
    )]
    pub room_number: Option<String>,
    pub room_type: Option<RoomType>,
    pub active: Option<bool>,
}

impl RoomUpdate {
    pub fn apply(self, room: &mut Room) {
        if let Some(room_number) = self.room_number {
            room.room_number = room_number.trim().to_string();
        }
        if let Some(room_type) = self.room_type {
            room.room_type = room_type;
        }
        if let Some(active) = self.active {
            room.active = active;
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBed {
    #[validate(
        custom(function = "not_blank"),
        length(max = 32, message = "must be at most 32 characters")
    )]
    pub bed_number: String,
    /// Initial status; defaults to available. `Occupied` is rejected.
    pub status: Option<BedStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BedUpdate {
    #[validate(
        custom(function = "not_blank"),
        length(max = 32, message = "must be at most 32 characters")
    )]
    pub bed_number: Option<String>,
    pub status: Option<BedStatus>,
}

fn default_true() -> bool {
    true
}
