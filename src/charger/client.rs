use crate::charger::status::{ChargerStatus, PhaseCount, STATUS_FIELDS};
use crate::config::ChargerConfig;
use crate::error::{HeliosError, Result};
use crate::logging::get_logger;
use std::fmt;
use std::time::Duration;

/// Desired charger fields, in the order they are sent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Setpoint {
    fields: Vec<(&'static str, String)>,
}

impl Setpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one field
    pub fn with(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
        self
    }

    /// Force-stop (`frc=1`)
    pub fn disable() -> Self {
        Self::new().with("frc", 1)
    }

    /// Release the charger at the given amperage and phase count
    pub fn charge(amperage: u8, phases: PhaseCount) -> Self {
        Self::new()
            .with("frc", 0)
            .with("amp", amperage)
            .with("psm", phases.psm_code())
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Fields whose canonical text differs from the status; absent keys differ
    pub fn diff(&self, status: &ChargerStatus) -> Vec<(&'static str, String)> {
        self.fields
            .iter()
            .filter(|(key, value)| status.canonical(key).as_deref() != Some(value.as_str()))
            .cloned()
            .collect()
    }
}

impl fmt::Display for Setpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Result of a write attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every field already matched; no request was sent
    Unchanged,
    /// The listed fields were sent to `/set`
    Applied(Vec<(&'static str, String)>),
}

/// go-e local HTTP API client
pub struct ChargerClient {
    base_url: String,
    http: reqwest::Client,
    logger: crate::logging::StructuredLogger,
}

impl ChargerClient {
    pub fn new(config: &ChargerConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(config, http))
    }

    pub fn with_http(config: &ChargerConfig, http: reqwest::Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            logger: get_logger("charger"),
        }
    }

    /// Poll `/status` with the fixed field filter
    pub async fn status(&self) -> Result<ChargerStatus> {
        self.logger.info("Fetching status from charger");
        let response = self
            .http
            .get(format!("{}/status", self.base_url))
            .query(&[("filter", STATUS_FIELDS)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let err = HeliosError::from_status("charger status", status);
            self.logger.error(&format!("Failed to fetch charger status: {}", err));
            return Err(err);
        }

        let body: serde_json::Value = response.json().await?;
        self.logger.debug(&format!("Charger status: {}", body));
        ChargerStatus::from_value(body)
    }

    /// Send only the fields that differ from `current`
    pub async fn write(
        &self,
        current: &ChargerStatus,
        desired: &Setpoint,
    ) -> Result<WriteOutcome> {
        let changed = desired.diff(current);
        if changed.is_empty() {
            self.logger
                .info(&format!("Charger already at {}, skipping write", desired));
            return Ok(WriteOutcome::Unchanged);
        }

        let response = self
            .http
            .get(format!("{}/set", self.base_url))
            .query(&changed)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let err = HeliosError::from_status("charger set", status);
            self.logger
                .error(&format!("Failed to set {} on charger: {}", desired, err));
            return Err(err);
        }

        let echo = match response.json::<serde_json::Value>().await {
            Ok(body) => body.to_string(),
            Err(e) => {
                self.logger
                    .debug(&format!("Charger set response is not JSON: {}", e));
                "unreadable".to_string()
            }
        };
        self.logger.info(&format!(
            "Charger updated: {} (response {})",
            changed
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(","),
            echo
        ));
        Ok(WriteOutcome::Applied(changed))
    }

    /// Force-stop charging
    pub async fn disable(&self, current: &ChargerStatus) -> Result<WriteOutcome> {
        self.write(current, &Setpoint::disable()).await
    }
}
