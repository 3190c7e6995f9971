//! Metrics repository - store queries for scrape-time gauges

use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use wardflow_models::{BedFilter, BedStatus};

use super::traits::{Store, TxMode};
use crate::Result;

/// Repository for metrics reads. The pool is absent on the memory backend.
#[derive(Clone)]
pub struct MetricsRepository {
    store: Arc<dyn Store>,
    pool: Option<PgPool>,
}

impl MetricsRepository {
    pub fn new(store: Arc<dyn Store>, pool: Option<PgPool>) -> Self {
        Self { store, pool }
    }

    /// Bed counts per status plus the number of non-discharged stays, from one snapshot.
    pub async fn bed_status_counts(&self) -> Result<(HashMap<BedStatus, i64>, i64)> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        let beds = tx.list_beds(&BedFilter::default()).await?;
        let active_stays = tx.count_active_stays().await?;
        tx.commit().await?;

        let mut counts: HashMap<BedStatus, i64> =
            BedStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for bed in &beds {
            *counts.entry(bed.status).or_default() += 1;
        }
        Ok((counts, active_stays as i64))
    }

    /// Get connection pool size and idle connections (for metrics)
    pub fn pool_usage(&self) -> Option<(u32, usize)> {
        self.pool.as_ref().map(|p| (p.size(), p.num_idle()))
    }
}
