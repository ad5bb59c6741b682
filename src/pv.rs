//! Canonical photovoltaic power model

use serde::Serialize;

/// One pass worth of PV, battery and grid readings.
///
/// All powers are in watts. `household` is derived from the other three and
/// cannot be set independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhotovoltaicSnapshot {
    solar_power: f64,
    battery_power: f64,
    grid_exchange: f64,
    state_of_charge: u8,
    household: f64,
}

impl PhotovoltaicSnapshot {
    pub fn new(
        solar_power: f64,
        battery_power: f64,
        grid_exchange: f64,
        state_of_charge: u8,
    ) -> Self {
        Self {
            solar_power,
            battery_power,
            grid_exchange,
            state_of_charge: state_of_charge.min(100),
            household: solar_power + battery_power + grid_exchange,
        }
    }

    /// Current production
    pub fn solar_power(&self) -> f64 {
        self.solar_power
    }

    /// Positive while discharging, negative while charging
    pub fn battery_power(&self) -> f64 {
        self.battery_power
    }

    /// Positive while importing, negative while exporting
    pub fn grid_exchange(&self) -> f64 {
        self.grid_exchange
    }

    /// Percent, 0..=100
    pub fn state_of_charge(&self) -> u8 {
        self.state_of_charge
    }

    pub fn household(&self) -> f64 {
        self.household
    }
}
