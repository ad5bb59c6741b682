//! go-e charger integration
//!
//! - `status`: typed snapshot over the `/status` payload
//! - `client`: status polling and diffed `/set` writes
//! - `readiness`: whether a pass should continue at all

pub mod client;
pub mod readiness;
pub mod status;

pub use client::{ChargerClient, Setpoint, WriteOutcome};
pub use readiness::{Readiness, ReadinessGate, StopReason, assess};
pub use status::{ChargerStatus, PhaseCount, PhasePreference, RegulationMode, VehicleState};
