use anyhow::Context as _;
use axum::http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;
use wardflow::AppState;
use wardflow_models::{Bed, BedFilter, BedStatus, StayFilter};

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(actual, expected, "{context}: unexpected HTTP status");
}

/// Asserts an error response carries `code`.
pub fn assert_error_code(body: &Value, code: &str) -> anyhow::Result<()> {
    let actual = body
        .pointer("/error/code")
        .and_then(Value::as_str)
        .context("response has error.code")?;
    assert_eq!(actual, code, "unexpected error code in {body}");
    Ok(())
}

/// A bed is occupied exactly when one active stay points at it, and no patient holds
/// two active stays. Each active stay's ward and room match its bed's location.
pub async fn assert_allocation_consistent(state: &AppState) -> anyhow::Result<()> {
    let beds = state.facility.list_beds(&BedFilter::default()).await?;
    let active = state
        .stays
        .list(&StayFilter {
            active: Some(true),
            ..Default::default()
        })
        .await?;

    let mut stays_per_bed: HashMap<Uuid, usize> = HashMap::new();
    let mut stays_per_patient: HashMap<Uuid, usize> = HashMap::new();
    for stay in &active {
        *stays_per_bed.entry(stay.bed_id).or_default() += 1;
        *stays_per_patient.entry(stay.patient_id).or_default() += 1;
    }

    for bed in &beds {
        let holders = stays_per_bed.get(&bed.id).copied().unwrap_or(0);
        assert!(holders <= 1, "bed {} has {holders} active stays", bed.id);
        assert_eq!(
            bed.status == BedStatus::Occupied,
            holders == 1,
            "bed {} is {} with {holders} active stays",
            bed.id,
            bed.status
        );
    }
    for (patient, count) in stays_per_patient {
        assert_eq!(count, 1, "patient {patient} has {count} active stays");
    }

    let beds_by_id: HashMap<Uuid, &Bed> = beds.iter().map(|bed| (bed.id, bed)).collect();
    for stay in &active {
        let bed = beds_by_id.get(&stay.bed_id).with_context(|| {
            format!("active stay {} points at missing bed {}", stay.id, stay.bed_id)
        })?;
        assert_eq!(
            stay.room_id, bed.room_id,
            "stay {} room differs from its bed's",
            stay.id
        );
        let room = state.facility.get_room(bed.room_id).await?;
        assert_eq!(
            stay.ward_id, room.ward_id,
            "stay {} ward differs from its room's",
            stay.id
        );
    }
    Ok(())
}
