use crate::charger::{ChargerStatus, PhaseCount, PhasePreference};
use crate::config::ChargerConfig;
use crate::error::{HeliosError, Result};
use serde::Serialize;

/// One admissible charger setting and the surplus it needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChargerSettingCandidate {
    pub power_threshold_w: f64,
    pub amperage: u8,
    #[serde(serialize_with = "serialize_phases")]
    pub phases: PhaseCount,
}

fn serialize_phases<S: serde::Serializer>(
    phases: &PhaseCount,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(phases.count())
}

/// Which candidates the charger's phase preference admits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEligibility {
    Any,
    Only(PhaseCount),
}

impl PhaseEligibility {
    /// `frm` 1 restricts to single phase, 2 admits everything, anything else
    /// pins the current `psm` (or admits everything when that is unknown)
    pub fn for_status(status: &ChargerStatus) -> Self {
        match status.phase_preference() {
            Some(PhasePreference::SingleOnly) => Self::Only(PhaseCount::Single),
            Some(PhasePreference::Automatic) => Self::Any,
            Some(PhasePreference::Fixed(_)) | None => {
                status.phase_mode().map_or(Self::Any, Self::Only)
            }
        }
    }

    pub fn allows(&self, phases: PhaseCount) -> bool {
        match self {
            Self::Any => true,
            Self::Only(only) => *only == phases,
        }
    }
}

/// Candidates ordered by threshold, highest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateTable {
    rows: Vec<ChargerSettingCandidate>,
}

impl CandidateTable {
    /// Every amperage in `min..=max` on three and on one phase.
    ///
    /// Equal thresholds keep three-phase rows ahead of single-phase ones.
    pub fn generate(voltage: f64, min_amperage: u8, max_amperage: u8) -> Self {
        let mut rows = Vec::new();
        for phases in [PhaseCount::Three, PhaseCount::Single] {
            for amperage in (min_amperage..=max_amperage).rev() {
                rows.push(ChargerSettingCandidate {
                    power_threshold_w: voltage * f64::from(amperage) * f64::from(phases.count()),
                    amperage,
                    phases,
                });
            }
        }
        rows.sort_by(|a, b| b.power_threshold_w.total_cmp(&a.power_threshold_w));
        Self { rows }
    }

    /// Explicit rows; they must already be ordered highest first
    pub fn from_rows(rows: Vec<ChargerSettingCandidate>) -> Result<Self> {
        if rows
            .windows(2)
            .any(|w| w[0].power_threshold_w < w[1].power_threshold_w)
        {
            return Err(HeliosError::validation(
                "charger.candidates",
                "Thresholds must be ordered from highest to lowest",
            ));
        }
        Ok(Self { rows })
    }

    /// Configured table, or one generated from the electrical limits
    pub fn from_config(config: &ChargerConfig) -> Result<Self> {
        if config.candidates.is_empty() {
            return Ok(Self::generate(
                config.voltage,
                config.min_amperage,
                config.max_amperage,
            ));
        }

        let rows = config
            .candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let phases = PhaseCount::from_count(c.phases).ok_or_else(|| {
                    HeliosError::validation(
                        format!("charger.candidates[{}].phases", idx),
                        "Must be 1 or 3".to_string(),
                    )
                })?;
                Ok(ChargerSettingCandidate {
                    power_threshold_w: c.power_threshold_w,
                    amperage: c.amperage,
                    phases,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_rows(rows)
    }

    pub fn rows(&self) -> &[ChargerSettingCandidate] {
        &self.rows
    }

    /// First eligible row whose threshold is at most `available_w`
    pub fn select(
        &self,
        available_w: f64,
        eligibility: PhaseEligibility,
    ) -> Option<&ChargerSettingCandidate> {
        self.rows
            .iter()
            .filter(|c| eligibility.allows(c.phases))
            .find(|c| c.power_threshold_w <= available_w)
    }

    /// Highest threshold in the table
    pub fn max_power(&self) -> Option<f64> {
        self.rows.first().map(|c| c.power_threshold_w)
    }
}
