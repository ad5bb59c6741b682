use super::{AllocationPolicy, CandidateTable, PolicyContext};
use crate::charger::ChargerStatus;
use crate::config::{HysteresisConfig, PolicyConfig, SocBoostConfig};
use crate::error::Result;
use crate::pv::PhotovoltaicSnapshot;

/// Household load without the charger's own draw
pub fn effective_household(pv: &PhotovoltaicSnapshot, status: &ChargerStatus) -> Result<f64> {
    Ok(pv.household() - status.current_energy_draw()?)
}

/// Let a nearly full home battery feed the car in the morning.
///
/// `cap_w` is the charger's maximum rated draw.
pub fn apply_soc_boost(
    available_w: f64,
    pv: &PhotovoltaicSnapshot,
    ctx: &PolicyContext,
    config: &SocBoostConfig,
    cap_w: f64,
) -> f64 {
    if config.enabled
        && pv.state_of_charge() > config.min_soc
        && ctx.local_hour < config.before_hour
    {
        (available_w + config.boost_watts).min(cap_w)
    } else {
        available_w
    }
}

/// Configured boost cap, else the top of the candidate table
pub fn boost_cap(config: &SocBoostConfig, table: &CandidateTable) -> f64 {
    config
        .max_power_watts
        .or_else(|| table.max_power())
        .unwrap_or(0.0)
}

/// Keep a running charge alive while the battery can cover dips
pub fn apply_hysteresis(
    available_w: f64,
    pv: &PhotovoltaicSnapshot,
    status: &ChargerStatus,
    config: &HysteresisConfig,
) -> Result<f64> {
    if !config.enabled || pv.state_of_charge() <= config.min_soc {
        return Ok(available_w);
    }
    let keeps_charging = status
        .regulation_mode()
        .is_some_and(|mode| mode.keeps_charging());
    if keeps_charging && status.current_energy_draw()? > 0.0 {
        Ok(available_w.max(config.floor_watts))
    } else {
        Ok(available_w)
    }
}

/// Solar minus household minus the charger's reserve, then overrides
pub struct StandardPolicy {
    table: CandidateTable,
    soc_boost: SocBoostConfig,
    boost_cap_w: f64,
    hysteresis: HysteresisConfig,
}

impl StandardPolicy {
    pub fn new(config: &PolicyConfig, table: CandidateTable) -> Self {
        Self {
            boost_cap_w: boost_cap(&config.soc_boost, &table),
            table,
            soc_boost: config.soc_boost.clone(),
            hysteresis: config.hysteresis.clone(),
        }
    }
}

impl AllocationPolicy for StandardPolicy {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn table(&self) -> &CandidateTable {
        &self.table
    }

    fn available_power(
        &self,
        pv: &PhotovoltaicSnapshot,
        status: &ChargerStatus,
        ctx: &PolicyContext,
    ) -> Result<f64> {
        let buffer = status.buffer_power_threshold().unwrap_or(0.0);
        let available = pv.solar_power() - effective_household(pv, status)? - buffer;
        let available = apply_soc_boost(available, pv, ctx, &self.soc_boost, self.boost_cap_w);
        apply_hysteresis(available, pv, status, &self.hysteresis)
    }
}

/// Power flowing into the home battery is not taken from the car
pub struct BatteryPriorityPolicy {
    table: CandidateTable,
    soc_boost: SocBoostConfig,
    boost_cap_w: f64,
    hysteresis: HysteresisConfig,
}

impl BatteryPriorityPolicy {
    pub fn new(config: &PolicyConfig, table: CandidateTable) -> Self {
        Self {
            boost_cap_w: boost_cap(&config.soc_boost, &table),
            table,
            soc_boost: config.soc_boost.clone(),
            hysteresis: config.hysteresis.clone(),
        }
    }
}

impl AllocationPolicy for BatteryPriorityPolicy {
    fn name(&self) -> &'static str {
        "battery_priority"
    }

    fn table(&self) -> &CandidateTable {
        &self.table
    }

    fn available_power(
        &self,
        pv: &PhotovoltaicSnapshot,
        status: &ChargerStatus,
        ctx: &PolicyContext,
    ) -> Result<f64> {
        let available = pv.solar_power() - effective_household(pv, status)?
            + pv.battery_power().min(0.0);
        let available = apply_soc_boost(available, pv, ctx, &self.soc_boost, self.boost_cap_w);
        apply_hysteresis(available, pv, status, &self.hysteresis)
    }
}

/// Reserve subtraction only
pub struct SimplePolicy {
    table: CandidateTable,
}

impl SimplePolicy {
    pub fn new(table: CandidateTable) -> Self {
        Self { table }
    }
}

impl AllocationPolicy for SimplePolicy {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn table(&self) -> &CandidateTable {
        &self.table
    }

    fn available_power(
        &self,
        pv: &PhotovoltaicSnapshot,
        status: &ChargerStatus,
        _ctx: &PolicyContext,
    ) -> Result<f64> {
        let buffer = status.buffer_power_threshold().unwrap_or(0.0);
        Ok(pv.solar_power() - effective_household(pv, status)? - buffer)
    }
}
