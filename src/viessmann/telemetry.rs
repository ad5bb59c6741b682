use crate::config::IotConfig;
use crate::error::{HeliosError, Result};
use crate::logging::{LogContext, get_logger_with_context};
use crate::pv::PhotovoltaicSnapshot;
use crate::viessmann::features::{
    BATTERY_POWER, FeatureResponse, FeatureValue, GRID_EXCHANGE, PV_PRODUCTION, STATE_OF_CHARGE,
    TELEMETRY_FEATURES,
};
use crate::viessmann::identity::IdentityClient;
use std::collections::HashMap;
use std::time::Duration;

/// Reads the PV/battery/grid features of one gateway
pub struct TelemetryClient {
    config: IotConfig,
    identity: IdentityClient,
    http: reqwest::Client,
    logger: crate::logging::StructuredLogger,
}

impl TelemetryClient {
    pub fn new(config: IotConfig, identity: IdentityClient, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(config, identity, http))
    }

    pub fn with_http(config: IotConfig, identity: IdentityClient, http: reqwest::Client) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("telemetry")
                .with_field("installation", config.installation_id.clone())
                .with_field("gateway", config.gateway_id.clone()),
        );
        Self {
            config,
            identity,
            http,
            logger,
        }
    }

    fn features_url(&self) -> String {
        format!(
            "{}/features/installations/{}/gateways/{}/devices/0/features",
            self.config.base_url.trim_end_matches('/'),
            self.config.installation_id,
            self.config.gateway_id
        )
    }

    /// Fully populated snapshot, or an error; never a partial one
    pub async fn fetch(&self) -> Result<PhotovoltaicSnapshot> {
        let token = self.identity.token().await?;

        let filter: Vec<(&str, &str)> = TELEMETRY_FEATURES
            .iter()
            .map(|name| ("filter", *name))
            .collect();
        let response = self
            .http
            .get(self.features_url())
            .bearer_auth(token.as_str())
            .query(&filter)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HeliosError::from_status("IoT features", status));
        }

        let body: FeatureResponse = response.json().await.map_err(|e| {
            HeliosError::telemetry(format!("Failed to parse feature response: {}", e))
        })?;
        let snapshot = snapshot_from_features(&body.into_map())?;

        self.logger.info(&format!(
            "PV {:.0} W, battery {:.0} W, grid {:.0} W, SoC {}%, household {:.0} W",
            snapshot.solar_power(),
            snapshot.battery_power(),
            snapshot.grid_exchange(),
            snapshot.state_of_charge(),
            snapshot.household()
        ));
        Ok(snapshot)
    }
}

/// Normalize the feature map; kW production becomes W
pub fn snapshot_from_features(
    features: &HashMap<String, FeatureValue>,
) -> Result<PhotovoltaicSnapshot> {
    let read = |name: &str| -> Result<f64> {
        features
            .get(name)
            .map(|f| f.value)
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                HeliosError::telemetry(format!("Feature '{}' missing from response", name))
            })
    };

    let solar_power = read(PV_PRODUCTION)? * 1000.0;
    let battery_power = read(BATTERY_POWER)?;
    let grid_exchange = read(GRID_EXCHANGE)?;
    let state_of_charge = read(STATE_OF_CHARGE)?.round().clamp(0.0, 100.0) as u8;

    Ok(PhotovoltaicSnapshot::new(
        solar_power,
        battery_power,
        grid_exchange,
        state_of_charge,
    ))
}
