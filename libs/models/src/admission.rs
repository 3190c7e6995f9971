//! Admission requests
//!
//! A request is created `Pending` by the doctor-facing collaborator and consumed
//! exactly once by an admin decision. `Approved` and `Rejected` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::facility::RoomType;
use crate::validation::not_blank;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    Emergency,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Emergency => "emergency",
        }
    }

    /// Triage rank; lower is served first.
    fn rank(&self) -> u8 {
        match self {
            Self::Emergency => 0,
            Self::Normal => 1,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "emergency" => Ok(Self::Emergency),
            other => Err(Error::UnknownVariant {
                kind: "urgency",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl AdmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdmissionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(Error::UnknownVariant {
                kind: "admission status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRequest {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    pub treatment_plan: Option<String>,
    pub urgency: Urgency,
    pub recommended_ward_id: Option<Uuid>,
    pub recommended_room_type: Option<RoomType>,
    pub status: AdmissionStatus,
    /// Set only when rejected.
    pub rejection_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<Uuid>,
    /// Stay created by the approval.
    pub stay_id: Option<Uuid>,
}

impl AdmissionRequest {
    pub fn ensure_pending(&self) -> crate::Result<()> {
        if self.status.is_terminal() {
            return Err(Error::AlreadyDecided(self.status.to_string()));
        }
        Ok(())
    }

    pub fn approve(
        &mut self,
        admin_id: Uuid,
        stay_id: Uuid,
        at: DateTime<Utc>,
    ) -> crate::Result<()> {
        self.ensure_pending()?;
        self.status = AdmissionStatus::Approved;
        self.decided_at = Some(at);
        self.decided_by = Some(admin_id);
        self.stay_id = Some(stay_id);
        Ok(())
    }

    pub fn reject(
        &mut self,
        admin_id: Uuid,
        reason: String,
        at: DateTime<Utc>,
    ) -> crate::Result<()> {
        self.ensure_pending()?;
        self.status = AdmissionStatus::Rejected;
        self.rejection_reason = Some(reason);
        self.decided_at = Some(at);
        self.decided_by = Some(admin_id);
        Ok(())
    }
}

/// Staff triage order: emergencies first, then oldest request first.
///
/// The id is the last tie-breaker so listings are fully deterministic.
pub fn triage_order(a: &AdmissionRequest, b: &AdmissionRequest) -> Ordering {
    a.urgency
        .rank()
        .cmp(&b.urgency.rank())
        .then_with(|| a.requested_at.cmp(&b.requested_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Payload of `submit`, produced upstream by the clinical assessment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAdmission {
    pub patient_id: Uuid,
    #[validate(custom(function = "not_blank"))]
    pub diagnosis: String,
    pub treatment_plan: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
    pub recommended_ward_id: Option<Uuid>,
    pub recommended_room_type: Option<RoomType>,
}

/// Target bed for an approval or a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BedAssignment {
    pub ward_id: Uuid,
    pub room_id: Uuid,
    pub bed_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectAdmission {
    /// Stored verbatim. Callers are expected to supply one; it is not enforced.
    #[serde(default)]
    pub reason: String,
}
