//! Inpatient facility models
//!
//! Strongly-typed structures shared by the allocation engine and its API.
//!
//! # Module Organization
//!
//! - `facility`: wards, rooms and beds with their command payloads
//! - `admission`: doctor-submitted admission requests and the triage order
//! - `stay`: inpatient stays, the stay state machine and daily notes
//! - `occupancy`: bed statistics and alert thresholds
//! - `query`: list filters shared by storage backends and the HTTP layer
//!
//! Every lifecycle field is an explicit enum. Transition rules live next to the
//! enum they govern so storage backends and services cannot drift apart.

pub mod admission;
pub mod error;
pub mod facility;
pub mod occupancy;
pub mod query;
pub mod stay;
pub mod validation;

pub use admission::*;
pub use error::{Error, Result};
pub use facility::*;
pub use occupancy::*;
pub use query::*;
pub use stay::*;
