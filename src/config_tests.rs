#![cfg(test)]

use super::config::*;

fn filled_config() -> Config {
    let mut config = Config::default();
    config.viessmann.iam.client_id = "client".to_string();
    config.viessmann.iot.installation_id = "123456".to_string();
    config.viessmann.iot.gateway_id = "7637415022052208".to_string();
    config
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.enabled);
    assert_eq!(config.http_timeout_secs, 10);
    assert_eq!(config.token_file, "token.json");
    assert_eq!(config.charger.min_amperage, 6);
    assert_eq!(config.policy.strategy, PolicyStrategy::Standard);
    assert!(config.viessmann.iam.use_pkce_flow);
}

#[test]
fn test_config_validation() {
    let mut config = filled_config();
    assert!(config.validate().is_ok());

    // Defaults alone lack installation identifiers
    assert!(Config::default().validate().is_err());

    config.charger.base_url = String::new();
    assert!(config.validate().is_err());

    config = filled_config();
    config.timezone = "Mars/Olympus_Mons".to_string();
    assert!(config.validate().is_err());

    config = filled_config();
    config.charger.min_amperage = 20;
    assert!(config.validate().is_err());
}

#[test]
fn test_candidate_table_validation() {
    let mut config = filled_config();
    config.charger.candidates = vec![
        CandidateConfig {
            power_threshold_w: 1380.0,
            amperage: 6,
            phases: 1,
        },
        CandidateConfig {
            power_threshold_w: 4140.0,
            amperage: 6,
            phases: 3,
        },
    ];
    assert!(config.validate().is_err());

    config.charger.candidates.reverse();
    assert!(config.validate().is_ok());

    config.charger.candidates[0].phases = 2;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let config = filled_config();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(config.viessmann.iot.gateway_id, deserialized.viessmann.iot.gateway_id);
    // Password never leaves the process through a saved file
    assert!(!yaml.contains("password"));
}
