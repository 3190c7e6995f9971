//! Inpatient stays and daily notes
//!
//! ```text
//! Admitted ──► UnderCare ──► TransferRequested ──► UnderCare
//!    │            │                 │
//!    └────────────┴─────────────────┴──► DischargeRequested ──► Discharged
//! ```
//!
//! `Admitted` may also go straight to `TransferRequested`. `Discharged` is terminal
//! and the stay becomes read-only history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::admission::{AdmissionRequest, BedAssignment, Urgency};
use crate::validation::not_blank;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StayStatus {
    Admitted,
    UnderCare,
    TransferRequested,
    DischargeRequested,
    Discharged,
}

impl StayStatus {
    pub const ALL: [StayStatus; 5] = [
        StayStatus::Admitted,
        StayStatus::UnderCare,
        StayStatus::TransferRequested,
        StayStatus::DischargeRequested,
        StayStatus::Discharged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::UnderCare => "under_care",
            Self::TransferRequested => "transfer_requested",
            Self::DischargeRequested => "discharge_requested",
            Self::Discharged => "discharged",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Discharged)
    }

    /// The complete edge set of the stay state machine.
    pub fn can_transition_to(&self, next: StayStatus) -> bool {
        use StayStatus::*;
        matches!(
            (self, next),
            (Admitted, UnderCare)
                | (Admitted, TransferRequested)
                | (UnderCare, TransferRequested)
                | (TransferRequested, UnderCare)
                | (Admitted, DischargeRequested)
                | (UnderCare, DischargeRequested)
                | (TransferRequested, DischargeRequested)
                | (DischargeRequested, Discharged)
        )
    }
}

impl fmt::Display for StayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StayStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admitted" => Ok(Self::Admitted),
            "under_care" => Ok(Self::UnderCare),
            "transfer_requested" => Ok(Self::TransferRequested),
            "discharge_requested" => Ok(Self::DischargeRequested),
            "discharged" => Ok(Self::Discharged),
            other => Err(Error::UnknownVariant {
                kind: "stay status",
                value: other.to_string(),
            }),
        }
    }
}

/// One patient's continuous inpatient episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stay {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub admission_request_id: Option<Uuid>,
    // Projection of the bed's parent chain, rewritten only by approve and transfer.
    pub ward_id: Uuid,
    pub room_id: Uuid,
    pub bed_id: Uuid,
    pub diagnosis: String,
    pub treatment_plan: Option<String>,
    pub urgency: Urgency,
    pub status: StayStatus,
    pub admitted_at: DateTime<Utc>,
    pub discharged_at: Option<DateTime<Utc>>,
    pub transfer_reason: Option<String>,
    pub transfer_suggested_ward_id: Option<Uuid>,
    pub transfer_requested_by: Option<Uuid>,
    pub transfer_requested_at: Option<DateTime<Utc>>,
    pub discharge_summary: Option<String>,
    pub discharge_requested_by: Option<Uuid>,
    pub discharge_requested_at: Option<DateTime<Utc>>,
    pub discharged_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Stay {
    /// The stay created by approving `request` onto `placement`.
    pub fn admit(request: &AdmissionRequest, placement: BedAssignment, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            admission_request_id: Some(request.id),
            ward_id: placement.ward_id,
            room_id: placement.room_id,
            bed_id: placement.bed_id,
            diagnosis: request.diagnosis.clone(),
            treatment_plan: request.treatment_plan.clone(),
            urgency: request.urgency,
            status: StayStatus::Admitted,
            admitted_at: at,
            discharged_at: None,
            transfer_reason: None,
            transfer_suggested_ward_id: None,
            transfer_requested_by: None,
            transfer_requested_at: None,
            discharge_summary: None,
            discharge_requested_by: None,
            discharge_requested_at: None,
            discharged_by: None,
            updated_at: at,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Move to `next`, leaving the stay untouched when the edge does not exist.
    pub fn transition(&mut self, next: StayStatus, at: DateTime<Utc>) -> crate::Result<StayStatus> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                entity: "stay",
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        let previous = self.status;
        self.status = next;
        self.updated_at = at;
        Ok(previous)
    }

    pub(crate) fn clear_transfer_request(&mut self) {
        self.transfer_reason = None;
        self.transfer_suggested_ward_id = None;
        self.transfer_requested_by = None;
        self.transfer_requested_at = None;
    }

    pub fn request_transfer(
        &mut self,
        doctor_id: Uuid,
        reason: String,
        suggested_ward_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> crate::Result<()> {
        self.transition(StayStatus::TransferRequested, at)?;
        self.transfer_reason = Some(reason);
        self.transfer_suggested_ward_id = suggested_ward_id;
        self.transfer_requested_by = Some(doctor_id);
        self.transfer_requested_at = Some(at);
        Ok(())
    }

    /// Completes a pending transfer onto `ward_id/room_id/bed_id`.
    pub fn move_to(
        &mut self,
        ward_id: Uuid,
        room_id: Uuid,
        bed_id: Uuid,
        at: DateTime<Utc>,
    ) -> crate::Result<()> {
        self.ensure_status(StayStatus::TransferRequested, StayStatus::UnderCare)?;
        self.transition(StayStatus::UnderCare, at)?;
        self.ward_id = ward_id;
        self.room_id = room_id;
        self.bed_id = bed_id;
        self.clear_transfer_request();
        Ok(())
    }

    /// Fails unless a transfer is pending.
    pub fn ensure_transfer_requested(&self) -> crate::Result<()> {
        self.ensure_status(StayStatus::TransferRequested, StayStatus::UnderCare)
    }

    pub fn cancel_transfer(&mut self, at: DateTime<Utc>) -> crate::Result<()> {
        self.ensure_status(StayStatus::TransferRequested, StayStatus::UnderCare)?;
        self.transition(StayStatus::UnderCare, at)?;
        self.clear_transfer_request();
        Ok(())
    }

    pub fn request_discharge(
        &mut self,
        doctor_id: Uuid,
        summary: String,
        at: DateTime<Utc>,
    ) -> crate::Result<()> {
        self.transition(StayStatus::DischargeRequested, at)?;
        self.clear_transfer_request();
        self.discharge_summary = Some(summary);
        self.discharge_requested_by = Some(doctor_id);
        self.discharge_requested_at = Some(at);
        Ok(())
    }

    pub fn discharge(&mut self, admin_id: Uuid, at: DateTime<Utc>) -> crate::Result<()> {
        self.transition(StayStatus::Discharged, at)?;
        self.discharged_at = Some(at);
        self.discharged_by = Some(admin_id);
        Ok(())
    }

    pub fn set_treatment_plan(&mut self, plan: String, at: DateTime<Utc>) -> crate::Result<()> {
        if self.status.is_terminal() {
            return Err(Error::InvalidTransition {
                entity: "stay",
                from: self.status.to_string(),
                to: "treatment plan update".to_string(),
            });
        }
        self.treatment_plan = Some(plan);
        self.updated_at = at;
        Ok(())
    }

    // UnderCare is reachable from Admitted too, so edges alone cannot tell a
    // transfer completion from begin-care.
    fn ensure_status(&self, expected: StayStatus, next: StayStatus) -> crate::Result<()> {
        if self.status != expected {
            return Err(Error::InvalidTransition {
                entity: "stay",
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        Ok(())
    }

    pub fn begin_care(&mut self, at: DateTime<Utc>) -> crate::Result<()> {
        self.ensure_status(StayStatus::Admitted, StayStatus::UnderCare)?;
        self.transition(StayStatus::UnderCare, at)?;
        Ok(())
    }
}

/// Append-only clinical note attached to a stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyNote {
    pub id: Uuid,
    pub stay_id: Uuid,
    pub doctor_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RequestTransfer {
    #[validate(custom(function = "not_blank"))]
    pub reason: String,
    pub suggested_ward_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelTransfer {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RequestDischarge {
    #[validate(custom(function = "not_blank"))]
    pub discharge_summary: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TreatmentPlanUpdate {
    #[validate(custom(function = "not_blank"))]
    pub treatment_plan: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewNote {
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}
