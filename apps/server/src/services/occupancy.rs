//! Occupancy statistics, derived on demand from bed states

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use wardflow_models::{
    compute_snapshot, BedFilter, OccupancySnapshot, RoomFilter, WardFilter, WardOccupancy,
};

use crate::db::{Store, TxMode};
use crate::{Error, Result};

#[derive(Clone)]
pub struct OccupancyService {
    store: Arc<dyn Store>,
}

impl OccupancyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Facility, ward and room figures read from one consistent snapshot.
    pub async fn snapshot(&self) -> Result<OccupancySnapshot> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        let wards = tx.list_wards(&WardFilter::default()).await?;
        let rooms = tx.list_rooms(&RoomFilter::default()).await?;
        let beds = tx.list_beds(&BedFilter::default()).await?;
        let current_patients = tx.count_active_stays().await?;
        tx.commit().await?;

        let snapshot = compute_snapshot(&wards, &rooms, &beds, current_patients, Utc::now());
        tracing::debug!(
            total_beds = snapshot.facility.total_beds,
            occupied_beds = snapshot.facility.occupied_beds,
            current_patients,
            "Occupancy snapshot computed"
        );
        Ok(snapshot)
    }

    pub async fn ward(&self, ward_id: Uuid) -> Result<WardOccupancy> {
        self.snapshot()
            .await?
            .wards
            .into_iter()
            .find(|w| w.ward_id == ward_id)
            .ok_or_else(|| Error::not_found("ward", ward_id))
    }
}
