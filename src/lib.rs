//! # Helios - PV surplus charging for go-e chargers
//!
//! A single-pass controller that reads photovoltaic production, home battery
//! and grid exchange from the Viessmann cloud, checks whether the go-e
//! charger is ready, and sets the charger to the largest amperage/phase
//! combination the current surplus can sustain. Intended to be run by an
//! external scheduler (cron, systemd timer).
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `persistence`: Cached bearer token storage
//! - `viessmann`: OAuth2 identity client and IoT telemetry
//! - `pv`: Canonical PV/battery/grid power model
//! - `charger`: go-e status, readiness gate and setpoint writes
//! - `controls`: Candidate table and allocation strategies
//! - `controller`: One ordered control pass with fail-safe disable

pub mod charger;
pub mod config;
pub mod controller;
pub mod controls;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod pv;
pub mod viessmann;

#[cfg(test)]
mod config_tests;

// Re-export commonly used types
pub use config::Config;
pub use controller::{Controller, PassOutcome};
pub use error::{HeliosError, Result};
