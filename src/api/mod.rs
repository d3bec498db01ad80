//! Vehicle API access.

pub mod client;

pub use client::{ClientConfig, VehicleClient};
