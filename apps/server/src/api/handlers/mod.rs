//! Request handlers for API endpoints
//!
//! Handlers extract the actor, path, query and body, call one service operation and
//! wrap its result in JSON. Errors convert into the shared error body.

pub mod admissions;
pub mod facility;
pub mod metrics;
pub mod occupancy;
pub mod stays;
pub mod system;
