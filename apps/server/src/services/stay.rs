//! Inpatient stay manager
//!
//! Every transition reads the stay under a row lock, applies the state machine from
//! `wardflow_models::stay` and writes back in the same transaction. Bed moves lock the
//! stay first and the affected beds after it, lowest id first.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use wardflow_models::{
    BedAssignment, BedStatus, CancelTransfer, DailyNote, NoteOrder, RequestDischarge,
    RequestTransfer, Stay, StayFilter, TreatmentPlanUpdate,
};

use super::{stay_conflict, verify_placement};
use crate::auth::{Actor, Role};
use crate::db::{Store, StoreTransaction, TxMode};
use crate::metrics::{BED_CONFLICTS_TOTAL, STAY_TRANSITIONS_TOTAL};
use crate::{Error, Result};

/// A stay together with its notes, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct StayDetail {
    #[serde(flatten)]
    pub stay: Stay,
    pub notes: Vec<DailyNote>,
}

#[derive(Clone)]
pub struct StayService {
    store: Arc<dyn Store>,
}

async fn locked_stay(tx: &mut dyn StoreTransaction, stay_id: Uuid) -> Result<Stay> {
    tx.lock_stay(stay_id)
        .await?
        .ok_or_else(|| Error::not_found("stay", stay_id))
}

fn record_transition(stay: &Stay, actor: &Actor, operation: &'static str) {
    STAY_TRANSITIONS_TOTAL
        .with_label_values(&[stay.status.as_str()])
        .inc();
    tracing::info!(
        stay_id = %stay.id,
        patient_id = %stay.patient_id,
        actor_id = %actor.id,
        status = %stay.status,
        operation,
        "Stay transitioned"
    );
}

impl StayService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn begin_care(&self, actor: &Actor, stay_id: Uuid) -> Result<Stay> {
        actor.require(Role::Doctor, "begin care")?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut stay = locked_stay(&mut *tx, stay_id).await?;
        stay.begin_care(Utc::now())?;
        tx.update_stay(&stay).await?;
        tx.commit().await?;

        record_transition(&stay, actor, "begin_care");
        Ok(stay)
    }

    pub async fn request_transfer(
        &self,
        actor: &Actor,
        stay_id: Uuid,
        input: RequestTransfer,
    ) -> Result<Stay> {
        let doctor_id = actor.require(Role::Doctor, "request transfer")?;
        input.validate()?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut stay = locked_stay(&mut *tx, stay_id).await?;
        if let Some(ward_id) = input.suggested_ward_id {
            if tx.get_ward(ward_id).await?.is_none() {
                return Err(Error::Validation(format!(
                    "suggested_ward_id: ward {ward_id} does not exist"
                )));
            }
        }
        stay.request_transfer(
            doctor_id,
            input.reason.trim().to_string(),
            input.suggested_ward_id,
            Utc::now(),
        )?;
        tx.update_stay(&stay).await?;
        tx.commit().await?;

        record_transition(&stay, actor, "request_transfer");
        Ok(stay)
    }

    /// Moves the patient onto `placement`, releasing the previous bed.
    pub async fn complete_transfer(
        &self,
        actor: &Actor,
        stay_id: Uuid,
        placement: BedAssignment,
    ) -> Result<Stay> {
        actor.require(Role::Admin, "complete transfer")?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut stay = locked_stay(&mut *tx, stay_id).await?;
        let now = Utc::now();

        stay.ensure_transfer_requested()?;

        let old_bed_id = stay.bed_id;
        if placement.bed_id == old_bed_id {
            return Err(Error::Validation(
                "bed_id: the patient already occupies this bed".to_string(),
            ));
        }

        let (first, second) = if old_bed_id < placement.bed_id {
            (old_bed_id, placement.bed_id)
        } else {
            (placement.bed_id, old_bed_id)
        };
        let first = tx.lock_bed(first).await?;
        let second = tx.lock_bed(second).await?;
        let (old_bed, new_bed) = if old_bed_id < placement.bed_id {
            (first, second)
        } else {
            (second, first)
        };

        let mut new_bed = new_bed.ok_or_else(|| Error::not_found("bed", placement.bed_id))?;
        verify_placement(&mut *tx, &placement, &new_bed).await?;
        if !new_bed.is_available() {
            BED_CONFLICTS_TOTAL.with_label_values(&["transfer"]).inc();
            tracing::warn!(
                stay_id = %stay_id,
                bed_id = %new_bed.id,
                bed_status = %new_bed.status,
                "Transfer lost the bed"
            );
            return Err(Error::InvalidState(format!(
                "bed {} is {}, not available",
                new_bed.bed_number, new_bed.status
            )));
        }

        if let Some(mut old_bed) = old_bed {
            old_bed.status = BedStatus::Available;
            old_bed.updated_at = now;
            tx.update_bed(&old_bed).await?;
        } else {
            tracing::warn!(
                stay_id = %stay_id,
                bed_id = %old_bed_id,
                "Previous bed no longer exists"
            );
        }

        new_bed.status = BedStatus::Occupied;
        new_bed.updated_at = now;
        tx.update_bed(&new_bed).await?;

        stay.move_to(placement.ward_id, placement.room_id, placement.bed_id, now)?;
        tx.update_stay(&stay)
            .await
            .map_err(|e| stay_conflict(e, placement.bed_id))?;
        tx.commit().await?;

        tracing::info!(
            stay_id = %stay_id,
            from_bed = %old_bed_id,
            to_bed = %placement.bed_id,
            "Transfer completed"
        );
        record_transition(&stay, actor, "complete_transfer");
        Ok(stay)
    }

    /// Withdraws a pending transfer; the patient keeps the current bed.
    pub async fn cancel_transfer(
        &self,
        actor: &Actor,
        stay_id: Uuid,
        input: CancelTransfer,
    ) -> Result<Stay> {
        actor.require(Role::Admin, "cancel transfer")?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut stay = locked_stay(&mut *tx, stay_id).await?;
        stay.cancel_transfer(Utc::now())?;
        tx.update_stay(&stay).await?;
        tx.commit().await?;

        tracing::info!(stay_id = %stay_id, reason = %input.reason, "Transfer cancelled");
        record_transition(&stay, actor, "cancel_transfer");
        Ok(stay)
    }

    pub async fn request_discharge(
        &self,
        actor: &Actor,
        stay_id: Uuid,
        input: RequestDischarge,
    ) -> Result<Stay> {
        let doctor_id = actor.require(Role::Doctor, "request discharge")?;
        input.validate()?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut stay = locked_stay(&mut *tx, stay_id).await?;
        stay.request_discharge(
            doctor_id,
            input.discharge_summary.trim().to_string(),
            Utc::now(),
        )?;
        tx.update_stay(&stay).await?;
        tx.commit().await?;

        record_transition(&stay, actor, "request_discharge");
        Ok(stay)
    }

    /// Ends the stay and frees its bed.
    pub async fn approve_discharge(&self, actor: &Actor, stay_id: Uuid) -> Result<Stay> {
        let admin_id = actor.require(Role::Admin, "approve discharge")?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut stay = locked_stay(&mut *tx, stay_id).await?;
        let now = Utc::now();
        stay.discharge(admin_id, now)?;

        match tx.lock_bed(stay.bed_id).await? {
            Some(mut bed) => {
                bed.status = BedStatus::Available;
                bed.updated_at = now;
                tx.update_bed(&bed).await?;
            }
            None => {
                tracing::warn!(
                    stay_id = %stay_id,
                    bed_id = %stay.bed_id,
                    "Discharged stay's bed no longer exists"
                );
            }
        }

        tx.update_stay(&stay).await?;
        tx.commit().await?;

        record_transition(&stay, actor, "approve_discharge");
        Ok(stay)
    }

    pub async fn update_treatment_plan(
        &self,
        actor: &Actor,
        stay_id: Uuid,
        input: TreatmentPlanUpdate,
    ) -> Result<Stay> {
        actor.require(Role::Doctor, "update treatment plan")?;
        input.validate()?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut stay = locked_stay(&mut *tx, stay_id).await?;
        stay.set_treatment_plan(input.treatment_plan, Utc::now())?;
        tx.update_stay(&stay).await?;
        tx.commit().await?;

        tracing::info!(stay_id = %stay_id, actor_id = %actor.id, "Treatment plan updated");
        Ok(stay)
    }

    pub async fn get(&self, stay_id: Uuid) -> Result<StayDetail> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        let stay = tx
            .get_stay(stay_id)
            .await?
            .ok_or_else(|| Error::not_found("stay", stay_id))?;
        let notes = tx.list_notes(stay_id, NoteOrder::NewestFirst).await?;
        Ok(StayDetail { stay, notes })
    }

    pub async fn list(&self, filter: &StayFilter) -> Result<Vec<Stay>> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        tx.list_stays(filter).await
    }
}
