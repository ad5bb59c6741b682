use helios::config::{Config, PolicyStrategy};
use std::fs;

fn filled() -> Config {
    let mut cfg = Config::default();
    cfg.viessmann.iam.client_id = "client".to_string();
    cfg.viessmann.iot.installation_id = "123456".to_string();
    cfg.viessmann.iot.gateway_id = "7637415022052208".to_string();
    cfg
}

#[test]
fn yaml_config_loads() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("helios_config.yaml");
    fs::write(
        &path,
        r#"
viessmann:
  iam:
    client_id: client
  iot:
    installation_id: "123456"
    gateway_id: "7637415022052208"
charger:
  base_url: http://10.0.0.5/api
  max_amperage: 32
policy:
  strategy: battery_priority
"#,
    )
    .unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.charger.base_url, "http://10.0.0.5/api");
    assert_eq!(loaded.charger.max_amperage, 32);
    assert_eq!(loaded.policy.strategy, PolicyStrategy::BatteryPriority);
    assert_eq!(loaded.policy.soc_boost.max_power_watts, None);
    assert!(loaded.validate().is_ok());
}

#[test]
fn legacy_json_layout_loads() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "enabled": false,
            "viessmann": {
                "iam": {
                    "base_url": "https://iam.viessmann.com/idp/v3",
                    "client_id": "abc",
                    "redirect_uri": "http://localhost:4200/",
                    "use_pkce_flow": false,
                    "username": "me@example.com",
                    "password": "hunter2"
                },
                "iot": {
                    "base_url": "https://api.viessmann.com/iot/v2",
                    "installation_id": "1",
                    "gateway_id": "2"
                }
            },
            "charger": { "base_url": "http://192.168.0.20/api" }
        }"#,
    )
    .unwrap();

    let cfg = Config::from_file(&path).unwrap();
    assert!(!cfg.enabled);
    assert!(!cfg.viessmann.iam.use_pkce_flow);
    assert_eq!(cfg.viessmann.iam.password, "hunter2");
    assert_eq!(cfg.charger.base_url, "http://192.168.0.20/api");
    // Unspecified groups fall back to defaults
    assert_eq!(cfg.charger.max_amperage, 16);
    assert_eq!(cfg.timezone, "Europe/Berlin");
    assert!(cfg.validate().is_ok());
}

#[test]
fn config_validation_errors() {
    let mut cfg = filled();
    cfg.viessmann.iot.gateway_id.clear();
    assert!(cfg.validate().is_err());

    cfg = filled();
    cfg.http_timeout_secs = 0;
    assert!(cfg.validate().is_err());

    cfg = filled();
    cfg.charger.voltage = 0.0;
    assert!(cfg.validate().is_err());

    cfg = filled();
    cfg.charger.min_amperage = 0;
    assert!(cfg.validate().is_err());

    cfg = filled();
    cfg.policy.soc_boost.before_hour = 25;
    assert!(cfg.validate().is_err());
}

#[test]
fn boost_cap_below_charger_maximum_is_rejected() {
    let mut cfg = filled();
    cfg.charger.max_amperage = 32;
    cfg.policy.soc_boost.max_power_watts = Some(11_040.0);
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("policy.soc_boost.max_power_watts"));

    cfg.policy.soc_boost.max_power_watts = Some(22_080.0);
    assert!(cfg.validate().is_ok());

    cfg.policy.soc_boost.max_power_watts = None;
    assert!(cfg.validate().is_ok());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn from_missing_file_fails() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("I/O error"));
}
