//! Readiness gate
//!
//! Decides from the charger status alone whether a pass should continue.
//! A stop is a normal outcome, not an error.

use crate::charger::status::{ChargerStatus, RegulationMode, VehicleState};
use crate::logging::get_logger;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `fup` is off on the charger
    SurplusDisabled,
    VehicleNotConnected,
    /// Vehicle full and the charger already released
    ChargingComplete,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SurplusDisabled => "Surplus charging disabled on charger",
            Self::VehicleNotConnected => "Vehicle not connected to charger",
            Self::ChargingComplete => "Vehicle completely charged",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Proceed,
    Stop(StopReason),
}

impl Readiness {
    pub fn proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Pure verdict; rules are checked in order and the first stop wins
pub fn assess(status: &ChargerStatus) -> Readiness {
    if !status.surplus_enabled() {
        return Readiness::Stop(StopReason::SurplusDisabled);
    }
    match status.vehicle_state() {
        VehicleState::Idle => Readiness::Stop(StopReason::VehicleNotConnected),
        VehicleState::Complete if status.regulation_mode() == Some(RegulationMode::Neutral) => {
            Readiness::Stop(StopReason::ChargingComplete)
        }
        _ => Readiness::Proceed,
    }
}

/// [`assess`] with the verdict logged
pub struct ReadinessGate {
    logger: crate::logging::StructuredLogger,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            logger: get_logger("readiness"),
        }
    }

    pub fn check(&self, status: &ChargerStatus) -> Readiness {
        let verdict = assess(status);
        match verdict {
            Readiness::Stop(reason) => self.logger.info(&format!("{}, exiting", reason)),
            Readiness::Proceed => self.logger.debug(&format!(
                "Charger ready (car={:?}, frc={:?})",
                status.vehicle_state(),
                status.regulation_mode()
            )),
        }
        verdict
    }
}
