mod common;

use common::{charger_config, status, status_json};
use helios::charger::{ChargerClient, PhaseCount, Setpoint, VehicleState, WriteOutcome};
use helios::error::HeliosError;
use mockito::{Matcher, Server};
use serde_json::json;

fn charger(server_url: &str) -> ChargerClient {
    ChargerClient::with_http(&charger_config(server_url), reqwest::Client::new())
}

#[tokio::test]
async fn status_uses_fixed_filter() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/status")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            "amp,psm,car,frc,nrg,fup,frm,pgt".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(status_json(true, 2, 0, 4140.0, 2, 200.0).to_string())
        .create_async()
        .await;

    let current = charger(&server.url()).status().await.unwrap();
    assert!(current.surplus_enabled());
    assert_eq!(current.vehicle_state(), VehicleState::Charging);
    assert_eq!(current.current_energy_draw().unwrap(), 4140.0);
    assert_eq!(current.buffer_power_threshold(), Some(200.0));
    mock.assert_async().await;
}

#[tokio::test]
async fn status_error_propagates() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/status")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let err = charger(&server.url()).status().await.unwrap_err();
    assert!(matches!(err, HeliosError::Api { .. }));
}

#[tokio::test]
async fn write_sends_only_changed_fields() {
    let mut server = Server::new_async().await;
    // amp=6 and frc=0 already match; only psm changes
    let mock = server
        .mock("GET", "/set")
        .match_query(Matcher::Exact("psm=2".into()))
        .with_status(200)
        .with_body(json!({"psm": true}).to_string())
        .create_async()
        .await;

    let current = status(true, 2, 0, 1380.0, 2, 0.0);
    let outcome = charger(&server.url())
        .write(&current, &Setpoint::charge(6, PhaseCount::Three))
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Applied(vec![("psm", "2".to_string())]));
    mock.assert_async().await;
}

#[tokio::test]
async fn write_succeeds_when_echo_is_not_json() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/set")
        .match_query(Matcher::Exact("frc=1".into()))
        .with_status(200)
        .with_body("<html>ok</html>")
        .create_async()
        .await;

    let current = status(true, 2, 0, 1380.0, 2, 0.0);
    let outcome = charger(&server.url()).disable(&current).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Applied(vec![("frc", "1".to_string())]));
    mock.assert_async().await;
}

#[tokio::test]
async fn write_is_noop_when_everything_matches() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/set")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = charger(&server.url());
    let current = status(true, 2, 0, 1380.0, 2, 0.0);
    let desired = Setpoint::charge(6, PhaseCount::Single);
    assert_eq!(client.write(&current, &desired).await.unwrap(), WriteOutcome::Unchanged);
    assert_eq!(client.write(&current, &desired).await.unwrap(), WriteOutcome::Unchanged);
    mock.assert_async().await;
}

#[tokio::test]
async fn disable_forces_off() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/set")
        .match_query(Matcher::Exact("frc=1".into()))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let client = charger(&server.url());
    client.disable(&status(true, 2, 0, 1380.0, 2, 0.0)).await.unwrap();
    // Already forced off: nothing to send
    let outcome = client.disable(&status(true, 2, 1, 0.0, 2, 0.0)).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Unchanged);
    mock.assert_async().await;
}

#[tokio::test]
async fn write_error_propagates() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/set")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let err = charger(&server.url())
        .disable(&status(true, 2, 0, 0.0, 2, 0.0))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"));
}
