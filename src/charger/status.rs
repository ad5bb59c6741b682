//! Charger status snapshot
//!
//! The local API returns a loosely typed JSON object. The raw object is kept
//! for the string-compared write diff; typed accessors are derived once at
//! construction.

use crate::error::{HeliosError, Result};
use serde_json::{Map, Value};

/// Fields requested from `/status`
pub const STATUS_FIELDS: &str = "amp,psm,car,frc,nrg,fup,frm,pgt";

/// `nrg` slot holding the total instantaneous draw (W)
pub const NRG_TOTAL_INDEX: usize = 11;

/// Vehicle state (`car`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    Unknown,
    /// No vehicle plugged in
    Idle,
    Charging,
    /// Plugged in, waiting for the vehicle or for release
    Waiting,
    Complete,
    Error,
}

impl VehicleState {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Idle,
            2 => Self::Charging,
            3 => Self::Waiting,
            4 => Self::Complete,
            5 => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// Force/regulation mode (`frc`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulationMode {
    /// Charger decides; charging allowed
    Neutral,
    ForcedOff,
    ForcedOn,
    Unknown(i64),
}

impl RegulationMode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Neutral,
            1 => Self::ForcedOff,
            2 => Self::ForcedOn,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Neutral => 0,
            Self::ForcedOff => 1,
            Self::ForcedOn => 2,
            Self::Unknown(code) => *code,
        }
    }

    /// Modes in which an active charge should be kept alive
    pub fn keeps_charging(&self) -> bool {
        matches!(self, Self::Neutral | Self::ForcedOn)
    }
}

/// Phase count as candidates and `psm` express it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseCount {
    Single,
    Three,
}

impl PhaseCount {
    pub fn from_count(phases: u8) -> Option<Self> {
        match phases {
            1 => Some(Self::Single),
            3 => Some(Self::Three),
            _ => None,
        }
    }

    /// `psm` wire value: 1 single-phase, 2 three-phase
    pub fn from_psm(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Single),
            2 => Some(Self::Three),
            _ => None,
        }
    }

    pub fn psm_code(&self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Three => 2,
        }
    }

    pub fn count(&self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Three => 3,
        }
    }
}

/// Phase preference (`frm`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhasePreference {
    /// Never switch to three phases
    SingleOnly,
    /// Charger may switch freely
    Automatic,
    /// Keep whatever `psm` currently says
    Fixed(i64),
}

impl PhasePreference {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::SingleOnly,
            2 => Self::Automatic,
            other => Self::Fixed(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChargerStatus {
    raw: Map<String, Value>,
    surplus_enabled: bool,
    vehicle_state: VehicleState,
    regulation_mode: Option<RegulationMode>,
    phase_mode: Option<PhaseCount>,
    phase_preference: Option<PhasePreference>,
    buffer_power_threshold: Option<f64>,
    amperage: Option<i64>,
}

impl ChargerStatus {
    /// Typed view over the `/status` object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(raw) => Ok(Self::from_map(raw)),
            other => Err(HeliosError::charger(format!(
                "Status response is not an object: {}",
                other
            ))),
        }
    }

    pub fn from_map(raw: Map<String, Value>) -> Self {
        let int = |key: &str| raw.get(key).and_then(as_integer);

        let surplus_enabled = match raw.get("fup") {
            Some(Value::Bool(b)) => *b,
            Some(other) => as_integer(other).is_some_and(|n| n != 0),
            None => false,
        };

        Self {
            surplus_enabled,
            vehicle_state: int("car").map_or(VehicleState::Unknown, VehicleState::from_code),
            regulation_mode: int("frc").map(RegulationMode::from_code),
            phase_mode: int("psm").and_then(PhaseCount::from_psm),
            phase_preference: int("frm").map(PhasePreference::from_code),
            buffer_power_threshold: raw.get("pgt").and_then(Value::as_f64),
            amperage: int("amp"),
            raw,
        }
    }

    pub fn surplus_enabled(&self) -> bool {
        self.surplus_enabled
    }

    pub fn vehicle_state(&self) -> VehicleState {
        self.vehicle_state
    }

    pub fn regulation_mode(&self) -> Option<RegulationMode> {
        self.regulation_mode
    }

    pub fn phase_mode(&self) -> Option<PhaseCount> {
        self.phase_mode
    }

    pub fn phase_preference(&self) -> Option<PhasePreference> {
        self.phase_preference
    }

    /// Reserve (W) withheld from the charger; absent means 0
    pub fn buffer_power_threshold(&self) -> Option<f64> {
        self.buffer_power_threshold
    }

    pub fn amperage(&self) -> Option<i64> {
        self.amperage
    }

    /// Total draw from `nrg[11]`; a short or non-numeric array is an error
    pub fn current_energy_draw(&self) -> Result<f64> {
        self.raw
            .get("nrg")
            .and_then(Value::as_array)
            .and_then(|nrg| nrg.get(NRG_TOTAL_INDEX))
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                HeliosError::charger(format!(
                    "Status field nrg[{}] missing or not numeric",
                    NRG_TOTAL_INDEX
                ))
            })
    }

    /// Canonical text of a raw field, used for write diffing
    pub fn canonical(&self, key: &str) -> Option<String> {
        self.raw.get(key).map(canonical_text)
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

/// Textual form both sides of a diff are compared in
pub fn canonical_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nrg_with_total(total: f64) -> Value {
        let mut nrg = vec![json!(0); 16];
        nrg[NRG_TOTAL_INDEX] = json!(total);
        Value::Array(nrg)
    }

    #[test]
    fn parses_typed_fields() {
        let status = ChargerStatus::from_value(json!({
            "amp": 10, "psm": 2, "car": 2, "frc": 0,
            "nrg": nrg_with_total(4600.0), "fup": true, "frm": 2, "pgt": 200
        }))
        .unwrap();
        assert!(status.surplus_enabled());
        assert_eq!(status.vehicle_state(), VehicleState::Charging);
        assert_eq!(status.regulation_mode(), Some(RegulationMode::Neutral));
        assert_eq!(status.phase_mode(), Some(PhaseCount::Three));
        assert_eq!(status.phase_preference(), Some(PhasePreference::Automatic));
        assert_eq!(status.buffer_power_threshold(), Some(200.0));
        assert_eq!(status.amperage(), Some(10));
        assert_eq!(status.current_energy_draw().unwrap(), 4600.0);
    }

    #[test]
    fn missing_fields_are_tolerated_until_used() {
        let status = ChargerStatus::from_value(json!({"car": 9, "nrg": [1, 2, 3]})).unwrap();
        assert!(!status.surplus_enabled());
        assert_eq!(status.vehicle_state(), VehicleState::Unknown);
        assert_eq!(status.regulation_mode(), None);
        assert_eq!(status.buffer_power_threshold(), None);
        assert!(status.current_energy_draw().is_err());
    }

    #[test]
    fn rejects_non_object() {
        assert!(ChargerStatus::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(canonical_text(&json!(16)), "16");
        assert_eq!(canonical_text(&json!("16")), "16");
        assert_eq!(canonical_text(&json!(true)), "true");
        assert_eq!(canonical_text(&json!(null)), "null");
    }

    #[test]
    fn psm_round_trip() {
        for phases in [PhaseCount::Single, PhaseCount::Three] {
            assert_eq!(PhaseCount::from_psm(phases.psm_code() as i64), Some(phases));
            assert_eq!(PhaseCount::from_count(phases.count()), Some(phases));
        }
        assert_eq!(PhaseCount::from_count(2), None);
    }
}
