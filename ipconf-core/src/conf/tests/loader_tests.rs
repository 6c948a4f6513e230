use crate::conf::{ConfigError, load_config, parse_config, validate_config};
use pretty_assertions::assert_eq;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

const MINIMAL: &str = r#"
ip_conf {
  service_path = "/platos/ip_dispatch"
}
"#;

const FULL: &str = r#"
server {
  listen  = "127.0.0.1:7000"
  threads = 4
}

global {
  env = "debug"
}

discovery {
  endpoints    = ["10.0.0.10:2379", "10.0.0.11:2379"]
  timeout_secs = 3
}

ip_conf {
  service_path        = "/platos/ip_dispatch"
  max_results         = 5
  stat_queue_capacity = 32
  debug_refresh_secs  = 2
}
"#;

#[test]
fn minimal_config_uses_defaults() {
    let cfg = parse_config(MINIMAL).expect("parse");

    assert_eq!(cfg.server.listen, "0.0.0.0:6789");
    assert_eq!(cfg.server.threads, None);
    assert!(!cfg.global.is_debug());
    assert_eq!(cfg.discovery.endpoints, vec!["localhost:2379".to_string()]);
    assert_eq!(cfg.discovery.timeout(), Duration::from_secs(5));
    assert_eq!(cfg.ip_conf.service_path, "/platos/ip_dispatch");
    assert_eq!(cfg.ip_conf.max_results, None);
    assert_eq!(cfg.ip_conf.stat_queue_capacity, 16);
    assert!(validate_config(&cfg).is_ok());
}

#[test]
fn full_config_is_parsed() {
    let cfg = parse_config(FULL).expect("parse");

    assert_eq!(cfg.server.listen, "127.0.0.1:7000");
    assert_eq!(cfg.server.threads, Some(4));
    assert!(cfg.global.is_debug());
    assert_eq!(cfg.discovery.endpoints.len(), 2);
    assert_eq!(cfg.discovery.timeout(), Duration::from_secs(3));
    assert_eq!(cfg.ip_conf.max_results, Some(5));
    assert_eq!(cfg.ip_conf.stat_queue_capacity, 32);
    assert_eq!(cfg.ip_conf.debug_refresh(), Duration::from_secs(2));
    assert!(validate_config(&cfg).is_ok());
}

#[test]
fn missing_ip_conf_block_fails_to_parse() {
    let result = parse_config("server {\n  listen = \"0.0.0.0:1\"\n}\n");

    assert!(result.is_err());
}

#[test]
fn invalid_listen_address_is_rejected() {
    let mut cfg = parse_config(MINIMAL).unwrap();
    cfg.server.listen = "not-an-address".to_string();

    let err = validate_config(&cfg).unwrap_err();

    assert!(matches!(err, ConfigError::InvalidListen { .. }));
}

#[test]
fn empty_service_path_is_rejected() {
    let mut cfg = parse_config(MINIMAL).unwrap();
    cfg.ip_conf.service_path = "  ".to_string();

    assert!(matches!(
        validate_config(&cfg),
        Err(ConfigError::EmptyServicePath)
    ));
}

#[test]
fn zero_limits_are_rejected() {
    let base = parse_config(MINIMAL).unwrap();

    let mut cfg = base.clone();
    cfg.ip_conf.max_results = Some(0);
    assert!(matches!(
        validate_config(&cfg),
        Err(ConfigError::InvalidMaxResults)
    ));

    let mut cfg = base.clone();
    cfg.ip_conf.stat_queue_capacity = 0;
    assert!(matches!(
        validate_config(&cfg),
        Err(ConfigError::InvalidStatQueueCapacity)
    ));

    let mut cfg = base.clone();
    cfg.discovery.timeout_secs = 0;
    assert!(matches!(
        validate_config(&cfg),
        Err(ConfigError::InvalidDiscoveryTimeout)
    ));

    let mut cfg = base;
    cfg.discovery.endpoints = vec![];
    assert!(matches!(
        validate_config(&cfg),
        Err(ConfigError::NoDiscoveryEndpoints)
    ));
}

#[test]
fn load_config_reads_file() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("ipconf.hcl");
    fs::write(&path, FULL).unwrap();

    // Act
    let cfg = load_config(&path).expect("load");

    // Assert
    assert_eq!(cfg.server.listen, "127.0.0.1:7000");
}

#[test]
fn load_config_reports_missing_file() {
    let dir = tempdir().unwrap();

    let err = load_config(&dir.path().join("missing.hcl")).unwrap_err();

    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn load_config_reports_parse_errors_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.hcl");
    fs::write(&path, "ip_conf {").unwrap();

    let err = load_config(&path).unwrap_err();

    match err {
        ConfigError::Parse { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}
