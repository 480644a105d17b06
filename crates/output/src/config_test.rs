//! Configuration tests

use std::net::{IpAddr, Ipv4Addr};

use super::*;

#[test]
fn test_defaults() {
    let config = SnapcastConfig::default();

    assert_eq!(config.port, 1704);
    assert!(config.bind_to_address.is_empty());
    assert!(config.zeroconf);
}

#[test]
fn test_with_port() {
    let config = SnapcastConfig::with_port(4953);
    assert_eq!(config.port, 4953);
    assert!(config.zeroconf);
}

#[test]
fn test_toml_minimal() {
    let config: SnapcastConfig = toml::from_str("").unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
    assert!(config.zeroconf);
}

#[test]
fn test_toml_full() {
    let config: SnapcastConfig = toml::from_str(
        r#"
        port = 1705
        bind_to_address = ["127.0.0.1", "::1"]
        zeroconf = false
        "#,
    )
    .unwrap();

    assert_eq!(config.port, 1705);
    assert_eq!(config.bind_to_address, vec!["127.0.0.1", "::1"]);
    assert!(!config.zeroconf);
}

#[test]
fn test_validate_accepts_good_addresses() {
    let config = SnapcastConfig {
        bind_to_address: vec!["0.0.0.0".into(), "::".into(), "192.168.1.5".into()],
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_bad_address() {
    let config = SnapcastConfig {
        bind_to_address: vec!["not-an-address".into()],
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, OutputError::InvalidConfig(_)));
}

#[test]
fn test_bind_addrs_default_is_wildcard() {
    let config = SnapcastConfig::default();
    let addrs = config.bind_addrs().unwrap();

    assert_eq!(addrs.len(), 1);
    assert_eq!(addrs[0].ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(addrs[0].port(), 1704);
}

#[test]
fn test_bind_addrs_uses_configured_port() {
    let config = SnapcastConfig {
        port: 9000,
        bind_to_address: vec!["127.0.0.1".into(), "::1".into()],
        ..Default::default()
    };

    let addrs = config.bind_addrs().unwrap();
    assert_eq!(addrs.len(), 2);
    assert!(addrs.iter().all(|a| a.port() == 9000));
}
