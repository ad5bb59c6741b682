use helios::error::HeliosError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(HeliosError::config("x"), HeliosError::Config { .. }));
    assert!(matches!(
        HeliosError::serialization("x"),
        HeliosError::Serialization { .. }
    ));
    assert!(matches!(HeliosError::io("x"), HeliosError::Io { .. }));
    assert!(matches!(
        HeliosError::network("x"),
        HeliosError::Network { .. }
    ));
    assert!(matches!(HeliosError::api("x"), HeliosError::Api { .. }));
}

#[test]
fn error_constructors_group_2() {
    assert!(matches!(HeliosError::auth("x"), HeliosError::Auth { .. }));
    assert!(matches!(
        HeliosError::telemetry("x"),
        HeliosError::Telemetry { .. }
    ));
    assert!(matches!(
        HeliosError::charger("x"),
        HeliosError::Charger { .. }
    ));
    assert!(matches!(
        HeliosError::validation("f", "m"),
        HeliosError::Validation { .. }
    ));
    assert!(matches!(
        HeliosError::timeout("x"),
        HeliosError::Timeout { .. }
    ));
}

#[test]
fn conversions() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(HeliosError::from(io), HeliosError::Io { .. }));

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        HeliosError::from(json),
        HeliosError::Serialization { .. }
    ));

    let jwt = jsonwebtoken::decode_header("garbage").unwrap_err();
    assert!(matches!(HeliosError::from(jwt), HeliosError::Auth { .. }));
}

#[test]
fn display_messages() {
    let e = HeliosError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));
}
