//! Integration tests for environment-based server configuration

use docfinder_a2a::{ConfigError, ServerConfigBuilder};
use serial_test::serial;
use std::env;

const SERVER_VARS: &[&str] = &[
    "DOCFINDER_BIND_ADDR",
    "DOCFINDER_AGENT_NAME",
    "DOCFINDER_AGENT_VERSION",
    "DOCFINDER_AGENT_DESCRIPTION",
    "DOCFINDER_PUBLIC_BASE_URL",
    "DOCFINDER_FUNCTION_NAME",
    "DOCFINDER_DEBUG",
    "DOCFINDER_TASK_TTL_SECS",
    "DOCFINDER_CLEANUP_INTERVAL_SECS",
    "DOCFINDER_ENABLE_CORS",
    "DOCFINDER_MAX_BODY_SIZE",
    "DOCFINDER_STRICT_CANCEL",
];

fn set_env(key: &str, value: &str) {
    unsafe {
        env::set_var(key, value);
    }
}

fn clear_all_docfinder_env_vars() {
    for key in SERVER_VARS {
        unsafe {
            env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn test_env_config_default_when_no_vars_set() {
    clear_all_docfinder_env_vars();

    let config = ServerConfigBuilder::from_env()
        .expect("should load defaults when no env vars set")
        .build()
        .expect("should build valid config");

    assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
    assert_eq!(config.identity.name, "Doctor Search Agent");
    assert_eq!(config.store.ttl_secs, 3600);
    assert_eq!(config.store.cleanup_interval_secs, 300);
    assert_eq!(config.max_body_size, 1024 * 1024);
    assert!(config.enable_cors);
    assert!(!config.debug);
    assert!(!config.strict_cancel);
    assert!(config.function_name.is_none());
}

#[test]
#[serial]
fn test_env_config_overrides() {
    clear_all_docfinder_env_vars();
    set_env("DOCFINDER_BIND_ADDR", "127.0.0.1:9090");
    set_env("DOCFINDER_AGENT_NAME", "Clinic Finder");
    set_env("DOCFINDER_AGENT_VERSION", "2.1.0");
    set_env("DOCFINDER_PUBLIC_BASE_URL", "https://clinic.example.com/");
    set_env("DOCFINDER_FUNCTION_NAME", "doctor-search-prod");
    set_env("DOCFINDER_DEBUG", "yes");
    set_env("DOCFINDER_TASK_TTL_SECS", "60");
    set_env("DOCFINDER_ENABLE_CORS", "off");
    set_env("DOCFINDER_MAX_BODY_SIZE", "2048");
    set_env("DOCFINDER_STRICT_CANCEL", "1");

    let config = ServerConfigBuilder::from_env()
        .expect("should load config")
        .build()
        .expect("should build valid config");

    assert_eq!(config.bind_addr.port(), 9090);
    assert_eq!(config.identity.name, "Clinic Finder");
    assert_eq!(config.identity.version, "2.1.0");
    assert_eq!(config.base_url().as_deref(), Some("https://clinic.example.com"));
    assert_eq!(config.function_name.as_deref(), Some("doctor-search-prod"));
    assert!(config.debug);
    assert_eq!(config.store.ttl_secs, 60);
    assert!(!config.enable_cors);
    assert_eq!(config.max_body_size, 2048);
    assert!(config.strict_cancel);

    clear_all_docfinder_env_vars();
}

#[test]
#[serial]
fn test_env_config_invalid_bool() {
    clear_all_docfinder_env_vars();
    set_env("DOCFINDER_STRICT_CANCEL", "sometimes");

    let err = ServerConfigBuilder::from_env().unwrap_err();
    match err {
        ConfigError::InvalidEnvVar { key, message } => {
            assert_eq!(key, "DOCFINDER_STRICT_CANCEL");
            assert!(message.contains("sometimes"));
        }
        other => panic!("unexpected error: {other}"),
    }

    clear_all_docfinder_env_vars();
}

#[test]
#[serial]
fn test_env_config_invalid_number() {
    clear_all_docfinder_env_vars();
    set_env("DOCFINDER_TASK_TTL_SECS", "an hour");

    let result = ServerConfigBuilder::from_env();
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));

    clear_all_docfinder_env_vars();
}

#[test]
#[serial]
fn test_env_config_invalid_base_url_fails_build() {
    clear_all_docfinder_env_vars();
    set_env("DOCFINDER_PUBLIC_BASE_URL", "clinic.example.com");

    let result = ServerConfigBuilder::from_env()
        .expect("raw value is accepted at load time")
        .build();
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));

    clear_all_docfinder_env_vars();
}

#[test]
#[serial]
fn test_env_config_empty_value_is_unset() {
    clear_all_docfinder_env_vars();
    set_env("DOCFINDER_AGENT_NAME", "");

    let config = ServerConfigBuilder::from_env().unwrap().build().unwrap();
    assert_eq!(config.identity.name, "Doctor Search Agent");

    clear_all_docfinder_env_vars();
}
