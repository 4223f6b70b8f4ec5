use ampshare::error::AmpshareError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        AmpshareError::config("x"),
        AmpshareError::Config { .. }
    ));
    assert!(matches!(
        AmpshareError::validation("f", "m"),
        AmpshareError::Validation { .. }
    ));
    assert!(matches!(
        AmpshareError::actuator("c1", "x"),
        AmpshareError::Actuator { .. }
    ));
    assert!(matches!(
        AmpshareError::timeout("x"),
        AmpshareError::Timeout { .. }
    ));
}

#[test]
fn error_constructors_group_2() {
    assert!(matches!(AmpshareError::io("x"), AmpshareError::Io { .. }));
    assert!(matches!(
        AmpshareError::channel("x"),
        AmpshareError::Channel { .. }
    ));
    assert!(matches!(
        AmpshareError::generic("x"),
        AmpshareError::Generic { .. }
    ));
}

#[test]
fn conversions() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(AmpshareError::from(io), AmpshareError::Io { .. }));

    let json = serde_json::from_str::<u32>("nope").unwrap_err();
    assert!(matches!(
        AmpshareError::from(json),
        AmpshareError::Serialization { .. }
    ));
}

#[test]
fn display_messages() {
    let e = AmpshareError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));

    let e = AmpshareError::channel("closed");
    assert_eq!(e.to_string(), "Channel error: closed");
}
