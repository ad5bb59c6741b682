//! Power allocation for surplus charging
//!
//! Maps a PV snapshot and the charger status to a discrete charger setting.
//! Every strategy shares the same final step: no positive surplus or no
//! fitting candidate means the charger is disabled.
//!
//! - `table`: candidate settings and lookup
//! - `strategies`: the configurable allocation strategies

pub mod strategies;
pub mod table;

use crate::charger::{ChargerStatus, PhaseCount, Setpoint};
use crate::config::PolicyConfig;
use crate::error::Result;
use crate::pv::PhotovoltaicSnapshot;
use chrono::{DateTime, TimeZone, Timelike};
use std::fmt;

pub use strategies::{BatteryPriorityPolicy, SimplePolicy, StandardPolicy};
pub use table::{CandidateTable, ChargerSettingCandidate, PhaseEligibility};

/// Wall-clock facts a decision may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyContext {
    /// Hour of day (0..=23) in the installation's timezone
    pub local_hour: u32,
}

impl PolicyContext {
    pub fn new(local_hour: u32) -> Self {
        Self { local_hour }
    }

    /// Context for `now` seen from `tz`
    pub fn at<Tz: TimeZone>(now: DateTime<chrono::Utc>, tz: &Tz) -> Self {
        Self {
            local_hour: now.with_timezone(tz).hour(),
        }
    }
}

/// What the charger should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargerSetting {
    Disable,
    Charge { amperage: u8, phases: PhaseCount },
}

impl ChargerSetting {
    pub fn setpoint(&self) -> Setpoint {
        match self {
            Self::Disable => Setpoint::disable(),
            Self::Charge { amperage, phases } => Setpoint::charge(*amperage, *phases),
        }
    }
}

impl fmt::Display for ChargerSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disable => f.write_str("disable"),
            Self::Charge { amperage, phases } => {
                write!(f, "{} A on {} phase(s)", amperage, phases.count())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationDecision {
    /// Surplus after all adjustments (W)
    pub available_power_w: f64,
    pub setting: ChargerSetting,
}

/// One allocation heuristic
pub trait AllocationPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn table(&self) -> &CandidateTable;

    /// Surplus the charger may use, in watts
    fn available_power(
        &self,
        pv: &PhotovoltaicSnapshot,
        status: &ChargerStatus,
        ctx: &PolicyContext,
    ) -> Result<f64>;

    fn compute_setting(
        &self,
        pv: &PhotovoltaicSnapshot,
        status: &ChargerStatus,
        ctx: &PolicyContext,
    ) -> Result<AllocationDecision> {
        let available_power_w = self.available_power(pv, status, ctx)?;
        Ok(AllocationDecision {
            available_power_w,
            setting: select_setting(self.table(), available_power_w, status),
        })
    }
}

/// Disable at or below zero, else the highest eligible candidate that fits
pub fn select_setting(
    table: &CandidateTable,
    available_power_w: f64,
    status: &ChargerStatus,
) -> ChargerSetting {
    if available_power_w <= 0.0 {
        return ChargerSetting::Disable;
    }
    table
        .select(available_power_w, PhaseEligibility::for_status(status))
        .map_or(ChargerSetting::Disable, |c| ChargerSetting::Charge {
            amperage: c.amperage,
            phases: c.phases,
        })
}

/// Strategy named by the configuration
pub fn build_policy(config: &PolicyConfig, table: CandidateTable) -> Box<dyn AllocationPolicy> {
    use crate::config::PolicyStrategy;
    match config.strategy {
        PolicyStrategy::Standard => Box::new(StandardPolicy::new(config, table)),
        PolicyStrategy::BatteryPriority => Box::new(BatteryPriorityPolicy::new(config, table)),
        PolicyStrategy::Simple => Box::new(SimplePolicy::new(table)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn local_hour_follows_timezone() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(PolicyContext::at(now, &chrono_tz::Europe::Berlin).local_hour, 14);
        assert_eq!(PolicyContext::at(now, &chrono_tz::UTC).local_hour, 12);
    }

    #[test]
    fn setting_to_setpoint() {
        assert_eq!(ChargerSetting::Disable.setpoint(), Setpoint::disable());
        let sp = ChargerSetting::Charge {
            amperage: 10,
            phases: PhaseCount::Three,
        }
        .setpoint();
        assert_eq!(sp.get("frc"), Some("0"));
        assert_eq!(sp.get("amp"), Some("10"));
        assert_eq!(sp.get("psm"), Some("2"));
    }
}
