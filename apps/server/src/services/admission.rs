//! Admission request workflow

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use wardflow_models::{
    AdmissionFilter, AdmissionRequest, AdmissionStatus, BedAssignment, BedStatus, RejectAdmission,
    Stay, SubmitAdmission,
};

use super::{stay_conflict, verify_placement};
use crate::auth::{Actor, Role};
use crate::db::{Store, TxMode};
use crate::metrics::{
    ADMISSION_DECISIONS_TOTAL, ADMISSION_REQUESTS_SUBMITTED_TOTAL, BED_CONFLICTS_TOTAL,
    STAY_TRANSITIONS_TOTAL,
};
use crate::{Error, Result};

/// Outcome of a successful approval.
#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    pub request: AdmissionRequest,
    pub stay: Stay,
}

#[derive(Clone)]
pub struct AdmissionService {
    store: Arc<dyn Store>,
}

impl AdmissionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, actor: &Actor, input: SubmitAdmission) -> Result<AdmissionRequest> {
        let doctor_id = actor.require(Role::Doctor, "submit admission request")?;
        input.validate()?;

        let request = AdmissionRequest {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id: input.patient_id,
            diagnosis: input.diagnosis.trim().to_string(),
            treatment_plan: input.treatment_plan,
            urgency: input.urgency,
            recommended_ward_id: input.recommended_ward_id,
            recommended_room_type: input.recommended_room_type,
            status: AdmissionStatus::Pending,
            rejection_reason: None,
            requested_at: Utc::now(),
            decided_at: None,
            decided_by: None,
            stay_id: None,
        };

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        tx.insert_request(&request).await?;
        tx.commit().await?;

        ADMISSION_REQUESTS_SUBMITTED_TOTAL
            .with_label_values(&[request.urgency.as_str()])
            .inc();
        tracing::info!(
            request_id = %request.id,
            patient_id = %request.patient_id,
            doctor_id = %doctor_id,
            urgency = %request.urgency,
            "Admission request submitted"
        );
        Ok(request)
    }

    /// Approves a pending request onto an available bed.
    ///
    /// The bed reservation, the new stay and the request decision commit together or
    /// not at all. A bed taken by a concurrent approval or transfer fails with
    /// `INVALID_STATE`.
    pub async fn approve(
        &self,
        actor: &Actor,
        request_id: Uuid,
        placement: BedAssignment,
    ) -> Result<Approval> {
        let admin_id = actor.require(Role::Admin, "approve admission request")?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut request = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| Error::not_found("pending admission request", request_id))?;
        request.ensure_pending()?;

        let mut bed = tx
            .lock_bed(placement.bed_id)
            .await?
            .ok_or_else(|| Error::not_found("bed", placement.bed_id))?;
        verify_placement(&mut *tx, &placement, &bed).await?;

        if !bed.is_available() {
            BED_CONFLICTS_TOTAL.with_label_values(&["approve"]).inc();
            tracing::warn!(
                request_id = %request_id,
                bed_id = %bed.id,
                bed_status = %bed.status,
                "Approval lost the bed"
            );
            return Err(Error::InvalidState(format!(
                "bed {} is {}, not available",
                bed.bed_number, bed.status
            )));
        }
        if let Some(existing) = tx.active_stay_for_patient(request.patient_id).await? {
            return Err(Error::InvalidState(format!(
                "patient {} already has active stay {}",
                request.patient_id, existing.id
            )));
        }

        let now = Utc::now();
        let stay = Stay::admit(&request, placement, now);
        tx.insert_stay(&stay)
            .await
            .map_err(|e| stay_conflict(e, bed.id))?;

        bed.status = BedStatus::Occupied;
        bed.updated_at = now;
        tx.update_bed(&bed).await?;

        request.approve(admin_id, stay.id, now)?;
        tx.update_request(&request).await?;
        tx.commit().await?;

        ADMISSION_DECISIONS_TOTAL
            .with_label_values(&[AdmissionStatus::Approved.as_str()])
            .inc();
        STAY_TRANSITIONS_TOTAL
            .with_label_values(&[stay.status.as_str()])
            .inc();
        tracing::info!(
            request_id = %request_id,
            stay_id = %stay.id,
            bed_id = %bed.id,
            admin_id = %admin_id,
            "Admission request approved"
        );
        Ok(Approval { request, stay })
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        request_id: Uuid,
        input: RejectAdmission,
    ) -> Result<AdmissionRequest> {
        let admin_id = actor.require(Role::Admin, "reject admission request")?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut request = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| Error::not_found("pending admission request", request_id))?;
        request.reject(admin_id, input.reason, Utc::now())?;
        tx.update_request(&request).await?;
        tx.commit().await?;

        ADMISSION_DECISIONS_TOTAL
            .with_label_values(&[AdmissionStatus::Rejected.as_str()])
            .inc();
        tracing::info!(
            request_id = %request_id,
            admin_id = %admin_id,
            "Admission request rejected"
        );
        Ok(request)
    }

    pub async fn get(&self, request_id: Uuid) -> Result<AdmissionRequest> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        tx.get_request(request_id)
            .await?
            .ok_or_else(|| Error::not_found("admission request", request_id))
    }

    /// Triage queue: emergencies first, then oldest first.
    pub async fn list(&self, filter: &AdmissionFilter) -> Result<Vec<AdmissionRequest>> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        tx.list_requests(filter).await
    }
}
