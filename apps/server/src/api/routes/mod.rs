//! Route tables

pub mod allocation;
pub mod operational;
