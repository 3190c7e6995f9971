//! Metrics service for scrape-time gauges

use wardflow_models::BedStatus;

use crate::db::MetricsRepository;
use crate::metrics::{ACTIVE_STAYS, BEDS, DB_CONNECTIONS_ACTIVE, DB_CONNECTIONS_IDLE};

/// Service for collecting application metrics
#[derive(Clone)]
pub struct MetricsService {
    repo: MetricsRepository,
}

impl MetricsService {
    pub fn new(repo: MetricsRepository) -> Self {
        Self { repo }
    }

    /// Update database connection pool metrics
    pub fn update_db_connection_metrics(&self) {
        if let Some((size, idle)) = self.repo.pool_usage() {
            let idle = idle as i64;
            DB_CONNECTIONS_ACTIVE.set((size as i64 - idle).max(0));
            DB_CONNECTIONS_IDLE.set(idle);
        }
    }

    /// Update bed and stay gauges; a failed read keeps the previous values.
    pub async fn update_occupancy_metrics(&self) {
        match self.repo.bed_status_counts().await {
            Ok((counts, active_stays)) => {
                for status in BedStatus::ALL {
                    let count = counts.get(&status).copied().unwrap_or(0);
                    BEDS.with_label_values(&[status.as_str()]).set(count);
                }
                ACTIVE_STAYS.set(active_stays);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to refresh occupancy metrics"),
        }
    }

    /// Collect all custom application metrics
    pub async fn collect_custom_metrics(&self, server_version: &str, backend: &str) -> String {
        self.update_db_connection_metrics();
        self.update_occupancy_metrics().await;

        let mut output = String::new();
        output.push_str("# HELP wardflow_server_info Allocation server information\n");
        output.push_str("# TYPE wardflow_server_info gauge\n");
        output.push_str(&format!(
            "wardflow_server_info{{version=\"{}\",backend=\"{}\"}} 1\n",
            server_version, backend
        ));
        output
    }
}
