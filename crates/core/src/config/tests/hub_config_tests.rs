use std::time::Duration;

use crate::config::HubConfig;

#[test]
fn test_default_config() {
    let config = HubConfig::default();
    assert!(config.validate().is_ok());

    // 验证默认值
    assert_eq!(config.health.check_interval(), Duration::from_secs(30));
    assert_eq!(config.health.probe_timeout(), Duration::from_secs(10));
    assert_eq!(config.cache.sweep_interval(), Duration::from_secs(1800));
    assert_eq!(config.cache.default_ttl(), Duration::from_secs(1800));
    assert_eq!(config.dispatcher.call_timeout(), None);
    assert!(config.events.install_default_handlers);
    assert_eq!(config.events.high_confidence_threshold, 0.9);
    assert!(config.gateway.use_default_catalog);
    assert!(config.gateway.services.is_empty());
    assert!(!config.observability.metrics_enabled);
}

#[test]
fn test_config_from_toml() {
    let toml_content = r#"
[health]
check_interval_seconds = 5
probe_timeout_seconds = 2

[cache]
sweep_interval_seconds = 60
default_ttl_seconds = 120

[dispatcher]
call_timeout_ms = 1500

[events]
install_default_handlers = false
high_confidence_threshold = 0.75

[gateway]
base_url = "http://services.internal:8080"
request_timeout_seconds = 15
use_default_catalog = false

[[gateway.services]]
name = "billing-service"
endpoint = "/api/billing"
dependencies = ["auth-service"]
priority = 3

[observability]
log_level = "debug"
log_format = "json"
"#;

    let config = HubConfig::from_toml(toml_content).unwrap();

    assert_eq!(config.health.check_interval_seconds, 5);
    assert_eq!(config.cache.default_ttl_seconds, 120);
    assert_eq!(
        config.dispatcher.call_timeout(),
        Some(Duration::from_millis(1500))
    );
    assert!(!config.events.install_default_handlers);
    assert_eq!(config.events.high_confidence_threshold, 0.75);
    assert_eq!(config.gateway.base_url, "http://services.internal:8080");
    assert!(!config.gateway.use_default_catalog);

    let billing = &config.gateway.services[0];
    assert_eq!(billing.name, "billing-service");
    assert_eq!(billing.health_endpoint, "/health");
    assert_eq!(billing.dependencies, vec!["auth-service".to_string()]);
    assert_eq!(billing.priority, 3);

    assert_eq!(config.observability.log_format, "json");
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = HubConfig::from_toml(
        r#"
[health]
check_interval_seconds = 12
"#,
    )
    .unwrap();

    assert_eq!(config.health.check_interval_seconds, 12);
    assert_eq!(config.health.probe_timeout_seconds, 10);
    assert_eq!(config.cache, HubConfig::default().cache);
}

#[test]
fn test_config_to_toml() {
    let config = HubConfig::default();
    let toml_str = config.to_toml().unwrap();

    assert!(toml_str.contains("[health]"));
    assert!(toml_str.contains("check_interval_seconds = 30"));

    let parsed = HubConfig::from_toml(&toml_str).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_validation_errors() {
    let mut config = HubConfig::default();
    config.health.check_interval_seconds = 0;
    assert!(config.validate().is_err());

    let mut config = HubConfig::default();
    config.events.high_confidence_threshold = 1.5;
    assert!(config.validate().is_err());

    let mut config = HubConfig::default();
    config.gateway.base_url = "ftp://example.com".to_string();
    assert!(config.validate().is_err());

    let mut config = HubConfig::default();
    config.dispatcher.call_timeout_ms = Some(0);
    assert!(config.validate().is_err());

    let mut config = HubConfig::default();
    config.observability.log_level = "verbose".to_string();
    assert!(config.validate().is_err());

    let mut config = HubConfig::default();
    config.observability.metrics_enabled = true;
    config.observability.metrics_listen = "not-an-address".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_toml_rejected() {
    let result = HubConfig::from_toml(
        r#"
[cache]
default_ttl_seconds = 0
"#,
    );
    assert!(result.is_err());

    let result = HubConfig::from_toml("[health\ncheck_interval_seconds = 5");
    assert!(result.is_err());
}
