//! Configuration management for Helios
//!
//! This module handles loading and validation of the controller configuration.
//! YAML is the native format; files ending in `.json` are read with
//! `serde_json` so the legacy `config.json` layout keeps working.

use crate::error::{HeliosError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Environment variable that points at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "HELIOS_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master switch; when false the binary exits without touching any service
    pub enabled: bool,

    /// IANA timezone used for the time-of-day policy rules
    pub timezone: String,

    /// Uniform timeout applied to every outbound HTTP request, in seconds
    pub http_timeout_secs: u64,

    /// Location of the cached bearer token
    pub token_file: String,

    /// Viessmann cloud (identity + IoT) configuration
    pub viessmann: ViessmannConfig,

    /// go-e charger local API configuration
    pub charger: ChargerConfig,

    /// Power allocation policy
    pub policy: PolicyConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Viessmann cloud services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViessmannConfig {
    /// Identity service (OAuth2)
    pub iam: IamConfig,

    /// IoT feature service
    pub iot: IotConfig,
}

/// Identity provider settings and resource-owner credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IamConfig {
    /// Base URL of the identity service (`/authorize`, `/token` are appended)
    pub base_url: String,

    /// OAuth2 client id
    pub client_id: String,

    /// Registered redirect URI
    pub redirect_uri: String,

    /// Use the PKCE authorization-code flow instead of the implicit flow
    pub use_pkce_flow: bool,

    /// Account username (HTTP Basic)
    pub username: String,

    /// Account password (HTTP Basic)
    #[serde(skip_serializing)]
    pub password: String,

    /// Fail the pass when the authorize redirect carries no code/token.
    /// When false an empty token is passed through and later rejected by the
    /// IoT service.
    pub strict_redirect: bool,
}

/// IoT feature service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IotConfig {
    /// Base URL of the IoT API
    pub base_url: String,

    /// Installation id
    pub installation_id: String,

    /// Gateway serial
    pub gateway_id: String,
}

/// Charger local API and electrical limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargerConfig {
    /// Base URL of the charger's local HTTP API (e.g. `http://192.168.1.50/api`)
    pub base_url: String,

    /// Nominal line voltage used to derive the candidate table
    pub voltage: f64,

    /// Lowest amperage the charger/vehicle accepts
    pub min_amperage: u8,

    /// Highest amperage the installation allows
    pub max_amperage: u8,

    /// Explicit candidate table; generated from the fields above when empty
    pub candidates: Vec<CandidateConfig>,
}

/// One row of an explicitly configured candidate table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Minimum available surplus (W) required for this setting
    pub power_threshold_w: f64,

    /// Amperage to set
    pub amperage: u8,

    /// Number of phases (1 or 3)
    pub phases: u8,
}

/// Which allocation strategy drives the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStrategy {
    /// Buffer subtraction plus SoC boost and hysteresis overrides
    Standard,
    /// Leave power flowing into a charging home battery untouched
    BatteryPriority,
    /// Buffer subtraction only
    Simple,
}

/// Allocation policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Strategy selector
    pub strategy: PolicyStrategy,

    /// Morning boost while the home battery is nearly full
    pub soc_boost: SocBoostConfig,

    /// Floor that keeps an active charge running
    pub hysteresis: HysteresisConfig,
}

/// State-of-charge boost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocBoostConfig {
    pub enabled: bool,

    /// Boost applies when state of charge is strictly above this percentage
    pub min_soc: u8,

    /// Boost applies when the local hour is strictly below this value
    pub before_hour: u32,

    /// Power added on top of the measured surplus (W)
    pub boost_watts: f64,

    /// Upper bound for the boosted value (W). Unset means the highest
    /// candidate threshold, i.e. the charger's maximum rated draw.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_power_watts: Option<f64>,
}

/// Hysteresis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    pub enabled: bool,

    /// Floor applies when state of charge is strictly above this percentage
    pub min_soc: u8,

    /// Minimum available power while a charge is running (W)
    pub floor_watts: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Directory receiving the daily log files
    pub directory: String,

    /// Number of daily files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML (or `.json`) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Config = if is_json {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };
        Ok(config)
    }

    /// Locate and load the configuration.
    ///
    /// Unlike a long-running service there is no sensible fallback: a missing
    /// file aborts startup.
    pub fn load() -> Result<Self> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(explicit);
        }

        let default_paths = [
            "helios_config.yaml",
            "config.json",
            "/etc/helios/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Err(HeliosError::config(format!(
            "No configuration found (set {} or create one of: {})",
            CONFIG_ENV_VAR,
            default_paths.join(", ")
        )))
    }

    /// Parsed timezone
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| HeliosError::validation("timezone", "Unknown IANA timezone"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("viessmann.iam.base_url", &self.viessmann.iam.base_url),
            ("viessmann.iam.client_id", &self.viessmann.iam.client_id),
            ("viessmann.iot.base_url", &self.viessmann.iot.base_url),
            (
                "viessmann.iot.installation_id",
                &self.viessmann.iot.installation_id,
            ),
            ("viessmann.iot.gateway_id", &self.viessmann.iot.gateway_id),
            ("charger.base_url", &self.charger.base_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(HeliosError::validation(field, "Cannot be empty"));
            }
        }

        if self.http_timeout_secs == 0 {
            return Err(HeliosError::validation(
                "http_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.charger.voltage <= 0.0 {
            return Err(HeliosError::validation("charger.voltage", "Must be positive"));
        }

        if self.charger.min_amperage == 0 || self.charger.min_amperage > self.charger.max_amperage
        {
            return Err(HeliosError::validation(
                "charger.min_amperage",
                "Must be positive and not above max_amperage",
            ));
        }

        for (idx, candidate) in self.charger.candidates.iter().enumerate() {
            if !matches!(candidate.phases, 1 | 3) {
                return Err(HeliosError::validation(
                    format!("charger.candidates[{}].phases", idx),
                    "Must be 1 or 3".to_string(),
                ));
            }
        }
        let descending = self
            .charger
            .candidates
            .windows(2)
            .all(|w| w[0].power_threshold_w >= w[1].power_threshold_w);
        if !descending {
            return Err(HeliosError::validation(
                "charger.candidates",
                "Thresholds must be ordered from highest to lowest",
            ));
        }

        if self.policy.soc_boost.before_hour > 24 {
            return Err(HeliosError::validation(
                "policy.soc_boost.before_hour",
                "Must be within 0..=24",
            ));
        }

        if let Some(cap) = self.policy.soc_boost.max_power_watts {
            let table = crate::controls::CandidateTable::from_config(&self.charger)?;
            let charger_max = table.max_power().unwrap_or(0.0);
            if cap < charger_max {
                return Err(HeliosError::validation(
                    "policy.soc_boost.max_power_watts".to_string(),
                    format!("Must be at least the charger maximum of {:.0} W", charger_max),
                ));
            }
        }

        self.tz()?;
        Ok(())
    }
}
