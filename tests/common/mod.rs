#![allow(dead_code)]

use helios::charger::ChargerStatus;
use helios::config::{ChargerConfig, IamConfig, IotConfig};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use std::time::Duration;

/// HS256 token expiring `exp_offset_secs` from now
pub fn jwt(exp_offset_secs: i64) -> String {
    let claims = json!({
        "sub": "user@example.com",
        "exp": chrono::Utc::now().timestamp() + exp_offset_secs,
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test"),
    )
    .unwrap()
}

pub fn iam_config(base_url: &str, use_pkce_flow: bool) -> IamConfig {
    IamConfig {
        base_url: base_url.to_string(),
        client_id: "client".to_string(),
        redirect_uri: "http://localhost:4200/".to_string(),
        use_pkce_flow,
        username: "user".to_string(),
        password: "secret".to_string(),
        strict_redirect: false,
    }
}

pub fn iot_config(base_url: &str) -> IotConfig {
    IotConfig {
        base_url: base_url.to_string(),
        installation_id: "123456".to_string(),
        gateway_id: "7637415022052208".to_string(),
    }
}

pub fn charger_config(base_url: &str) -> ChargerConfig {
    ChargerConfig {
        base_url: base_url.to_string(),
        ..ChargerConfig::default()
    }
}

pub fn no_redirect_http() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

pub const FEATURES_PATH: &str =
    "/features/installations/123456/gateways/7637415022052208/devices/0/features";

/// `nrg` array with the total draw in slot 11
pub fn nrg(total_w: f64) -> Value {
    let mut values = vec![json!(0); 16];
    values[11] = json!(total_w);
    Value::Array(values)
}

/// Status payload as the charger returns it
pub fn status_json(fup: bool, car: i64, frc: i64, draw_w: f64, frm: i64, pgt: f64) -> Value {
    json!({
        "amp": 6,
        "psm": 1,
        "car": car,
        "frc": frc,
        "nrg": nrg(draw_w),
        "fup": fup,
        "frm": frm,
        "pgt": pgt,
    })
}

pub fn status(fup: bool, car: i64, frc: i64, draw_w: f64, frm: i64, pgt: f64) -> ChargerStatus {
    ChargerStatus::from_value(status_json(fup, car, frc, draw_w, frm, pgt)).unwrap()
}

/// IoT response carrying all four telemetry features
pub fn features_body(production_kw: f64, battery_w: f64, grid_w: f64, soc: f64) -> String {
    let feature = |name: &str, value: f64, unit: &str| {
        json!({
            "feature": name,
            "properties": { "value": { "type": "number", "value": value, "unit": unit } }
        })
    };
    json!({
        "data": [
            feature("photovoltaic.production.current", production_kw, "kilowatt"),
            feature("ess.power", battery_w, "watt"),
            feature("pcc.transfer.power.exchange", grid_w, "watt"),
            feature("ess.stateOfCharge", soc, "percent"),
        ]
    })
    .to_string()
}
