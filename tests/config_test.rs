use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

use hostpool::host::Endpoint;

/// Test loading configuration from YAML file
#[test]
fn test_load_yaml_config() {
    let yaml = r#"
cluster:
  endpoints:
    - es-1.test.com:9200
    - es-2.test.com:9200
    - "[::1]:9201"
  use_ssl: true
  insecure: true
  path_prefix: /elastic
  username: elastic
  password: secret
  headers:
    X-Opaque-Id: tests

probe:
  timeout_ms: 250
  watch_interval_secs: 30
  first_success: false

transport:
  connect_timeout_ms: 1500
  request_timeout_ms: 5000
  pool_idle_timeout_secs: 30
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = hostpool::config::load_from_yaml(&config_path).unwrap();

    let endpoints = config.endpoints().unwrap();
    assert_eq!(endpoints.len(), 3);
    assert_eq!(endpoints[0], Endpoint::new("es-1.test.com", 9200));
    assert_eq!(endpoints[2], Endpoint::new("::1", 9201));

    assert!(config.cluster.use_ssl);
    assert!(config.cluster.insecure);
    assert_eq!(config.probe_timeout(), Duration::from_millis(250));
    assert_eq!(config.watch_interval(), Duration::from_secs(30));
    assert!(!config.provider_options().first_success);

    let transport = config.transport_config().unwrap();
    assert_eq!(transport.path_prefix.as_deref(), Some("/elastic"));
    assert_eq!(transport.connect_timeout, Duration::from_millis(1500));
    assert_eq!(transport.request_timeout, Duration::from_secs(5));
    assert_eq!(transport.pool_idle_timeout, Duration::from_secs(30));
    assert_eq!(
        transport.default_headers.get("authorization").unwrap(),
        "Basic ZWxhc3RpYzpzZWNyZXQ="
    );
}

/// Test loading configuration from environment variables
#[test]
fn test_load_env_config() {
    let vars = [
        "HOSTPOOL_ENDPOINTS",
        "HOSTPOOL_USE_SSL",
        "HOSTPOOL_PATH_PREFIX",
        "HOSTPOOL_USERNAME",
        "HOSTPOOL_PROBE_TIMEOUT_MS",
    ];
    let originals: Vec<_> = vars.iter().map(|k| (*k, env::var(k).ok())).collect();

    env::set_var("HOSTPOOL_ENDPOINTS", "es-1:9200, es-2 ,,es-3:9201");
    env::set_var("HOSTPOOL_USE_SSL", "true");
    env::set_var("HOSTPOOL_PATH_PREFIX", "/search");
    env::set_var("HOSTPOOL_USERNAME", "elastic");
    env::set_var("HOSTPOOL_PROBE_TIMEOUT_MS", "300");

    let config = hostpool::config::load_from_env().unwrap();

    assert_eq!(config.cluster.endpoints, vec!["es-1:9200", "es-2", "es-3:9201"]);
    assert_eq!(config.endpoints().unwrap()[1], Endpoint::new("es-2", 9200));
    assert!(config.cluster.use_ssl);
    assert_eq!(config.cluster.path_prefix.as_deref(), Some("/search"));
    assert_eq!(config.cluster.username.as_deref(), Some("elastic"));
    assert_eq!(config.probe_timeout(), Duration::from_millis(300));

    // Bad numeric value is reported, not ignored
    env::set_var("HOSTPOOL_PROBE_TIMEOUT_MS", "soon");
    assert!(hostpool::config::load_from_env().is_err());

    // Empty endpoint list is rejected
    env::set_var("HOSTPOOL_PROBE_TIMEOUT_MS", "300");
    env::set_var("HOSTPOOL_ENDPOINTS", " , ");
    assert!(hostpool::config::load_from_env().is_err());

    for (key, value) in originals {
        cleanup_env(key, value);
    }
}

/// Test default values
#[test]
fn test_default_values() {
    let yaml = r#"
cluster:
  endpoints:
    - localhost
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = hostpool::config::load_config(config_path.to_str()).unwrap();

    assert_eq!(config.endpoints().unwrap(), vec![Endpoint::new("localhost", 9200)]);
    assert!(!config.cluster.use_ssl);
    assert!(config.cluster.headers.is_empty());
    assert_eq!(config.probe.timeout_ms, 1000);
    assert_eq!(config.probe.watch_interval_secs, 5);
    assert!(config.probe.first_success);
    assert_eq!(config.transport.connect_timeout_ms, 10_000);
    assert_eq!(config.transport.request_timeout_ms, 30_000);

    let transport = config.transport_config().unwrap();
    assert!(transport.default_headers.is_empty());
}

/// Malformed endpoints fail when the core is built
#[test]
fn test_malformed_endpoint_rejected() {
    let config = hostpool::Config::with_endpoints(vec!["es-1:92x0".to_string()]);
    assert!(config.endpoints().is_err());
    assert!(hostpool::Core::new(config).is_err());
}

/// A zero refresh interval is refused at load time and when building the core
#[test]
fn test_zero_watch_interval_rejected() {
    let yaml = r#"
cluster:
  endpoints:
    - es-1:9200
probe:
  watch_interval_secs: 0
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();
    assert!(hostpool::config::load_from_yaml(&config_path).is_err());

    let mut config = hostpool::Config::with_endpoints(vec!["es-1:9200".to_string()]);
    config.probe.watch_interval_secs = 0;
    assert!(hostpool::Core::new(config).is_err());
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.yaml");
    assert!(hostpool::config::load_from_yaml(&missing).is_err());
}

/// Helper function to cleanup environment variables
fn cleanup_env(key: &str, orig_val: Option<String>) {
    match orig_val {
        Some(val) => env::set_var(key, val),
        None => env::remove_var(key),
    }
}
