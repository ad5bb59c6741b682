//! IoT feature payloads
//!
//! Only the scalar `properties.value` of each feature is kept; everything
//! else the service sends along is dropped during deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current PV production, reported in kW
pub const PV_PRODUCTION: &str = "photovoltaic.production.current";
/// Home battery power, positive while discharging
pub const BATTERY_POWER: &str = "ess.power";
/// Grid exchange, positive while importing
pub const GRID_EXCHANGE: &str = "pcc.transfer.power.exchange";
/// Home battery state of charge in percent
pub const STATE_OF_CHARGE: &str = "ess.stateOfCharge";

/// Filter list sent with every feature request
pub const TELEMETRY_FEATURES: [&str; 4] =
    [PV_PRODUCTION, BATTERY_POWER, GRID_EXCHANGE, STATE_OF_CHARGE];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub value: FeatureValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub feature: String,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureResponse {
    pub data: Vec<Feature>,
}

impl FeatureResponse {
    /// Feature name to value; the first occurrence of a name wins
    pub fn into_map(self) -> HashMap<String, FeatureValue> {
        let mut map = HashMap::with_capacity(self.data.len());
        for item in self.data {
            map.entry(item.feature).or_insert(item.properties.value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_payload() {
        let body = r#"{
            "data": [
                {
                    "feature": "ess.power",
                    "gatewayId": "7637415022052208",
                    "isEnabled": true,
                    "properties": { "value": { "type": "number", "value": -250, "unit": "watt" } }
                },
                {
                    "feature": "ess.stateOfCharge",
                    "properties": { "value": { "type": "number", "value": 81.0 } }
                }
            ]
        }"#;
        let map = serde_json::from_str::<FeatureResponse>(body)
            .unwrap()
            .into_map();
        assert_eq!(map[BATTERY_POWER].value, -250.0);
        assert_eq!(map[BATTERY_POWER].unit, "watt");
        assert_eq!(map[STATE_OF_CHARGE].value, 81.0);
        assert!(map[STATE_OF_CHARGE].unit.is_empty());
        assert!(!map.contains_key(PV_PRODUCTION));
    }

    #[test]
    fn rejects_non_numeric_value() {
        let body = serde_json::json!({
            "data": [{
                "feature": "ess.power",
                "properties": { "value": { "type": "string", "value": "n/a" } }
            }]
        });
        assert!(serde_json::from_value::<FeatureResponse>(body).is_err());
    }
}
