//! Metrics collection for the allocation server
//!
//! Prometheus metrics for HTTP traffic, admission decisions, stay transitions and
//! bed races. Bed and stay gauges are refreshed from a snapshot at scrape time.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, register_int_gauge_vec,
    HistogramVec, IntCounterVec, IntGauge, IntGaugeVec,
};

lazy_static! {
    // HTTP Request Metrics

    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "wardflow_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "wardflow_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "wardflow_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    // Workflow Metrics

    /// Admission decisions by outcome (`approved`, `rejected`)
    pub static ref ADMISSION_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "wardflow_admission_decisions_total",
        "Total number of admission request decisions",
        &["decision"]
    )
    .expect("Failed to register ADMISSION_DECISIONS_TOTAL");

    pub static ref ADMISSION_REQUESTS_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "wardflow_admission_requests_submitted_total",
        "Total number of submitted admission requests",
        &["urgency"]
    )
    .expect("Failed to register ADMISSION_REQUESTS_SUBMITTED_TOTAL");

    /// Stay transitions by target status
    pub static ref STAY_TRANSITIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "wardflow_stay_transitions_total",
        "Total number of stay status transitions",
        &["to"]
    )
    .expect("Failed to register STAY_TRANSITIONS_TOTAL");

    /// Operations that lost the race for a bed
    pub static ref BED_CONFLICTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "wardflow_bed_conflicts_total",
        "Total number of bed assignments rejected because the bed was not available",
        &["operation"]
    )
    .expect("Failed to register BED_CONFLICTS_TOTAL");

    // Facility Gauges

    pub static ref BEDS: IntGaugeVec = register_int_gauge_vec!(
        "wardflow_beds",
        "Number of beds by status",
        &["status"]
    )
    .expect("Failed to register BEDS");

    pub static ref ACTIVE_STAYS: IntGauge = register_int_gauge!(
        "wardflow_active_stays",
        "Number of non-discharged stays"
    )
    .expect("Failed to register ACTIVE_STAYS");

    // Database Metrics

    pub static ref DB_CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        "wardflow_db_connections_active",
        "Number of active database connections"
    )
    .expect("Failed to register DB_CONNECTIONS_ACTIVE");

    pub static ref DB_CONNECTIONS_IDLE: IntGauge = register_int_gauge!(
        "wardflow_db_connections_idle",
        "Number of idle database connections"
    )
    .expect("Failed to register DB_CONNECTIONS_IDLE");
}

/// Replace UUID path segments with `{id}` to bound label cardinality.
pub fn sanitize_path(path: &str) -> String {
    if path == "/" {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| {
            if uuid::Uuid::parse_str(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
