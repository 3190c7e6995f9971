//! Wardflow - inpatient admission and bed allocation server
//!
//! - Facility registry of wards, rooms and beds
//! - Admission requests reviewed by admins and approved onto a bed atomically
//! - Stay lifecycle through transfer and discharge
//! - Daily notes and treatment plans
//! - Occupancy statistics with alert thresholds
//!
//! Storage sits behind [`db::Store`]; PostgreSQL in production, in-memory for tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod request_context;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
