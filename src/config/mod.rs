use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use hyper::header::HeaderMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::host::{Endpoint, HeaderSupplier, ProviderOptions};
use crate::transport::{self, TransportConfig};

/// Cluster connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Node addresses as `host:port` (port defaults to 9200)
    pub endpoints: Vec<String>,

    /// Use https (default: false)
    #[serde(default)]
    pub use_ssl: bool,

    /// Skip TLS certificate verification (default: false)
    #[serde(default)]
    pub insecure: bool,

    /// Path prefix for every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,

    /// Basic auth user name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Extra headers sent with every probe and request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Probing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Per-probe timeout in milliseconds (default: 1000)
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,

    /// Background refresh interval in seconds (default: 5)
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,

    /// Return the first node found online in a probing pass (default: true)
    #[serde(default = "default_first_success")]
    pub first_success: bool,
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

fn default_watch_interval_secs() -> u64 {
    5
}

fn default_first_success() -> bool {
    true
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
            watch_interval_secs: default_watch_interval_secs(),
            first_success: default_first_success(),
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connect timeout in milliseconds (default: 10000)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Request timeout in milliseconds (default: 30000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Idle pooled connection timeout in seconds (default: 90)
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_pool_idle_timeout_secs() -> u64 {
    90
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub transport: HttpConfig,
}

impl Config {
    /// Configuration for the given endpoints with default settings
    pub fn with_endpoints(endpoints: Vec<String>) -> Self {
        Self {
            cluster: ClusterConfig {
                endpoints,
                use_ssl: false,
                insecure: false,
                path_prefix: None,
                username: None,
                password: None,
                headers: BTreeMap::new(),
            },
            probe: ProbeConfig::default(),
            transport: HttpConfig::default(),
        }
    }

    /// Parse every configured endpoint, failing on the first malformed one
    pub fn endpoints(&self) -> Result<Vec<Endpoint>> {
        self.cluster
            .endpoints
            .iter()
            .map(|s| Endpoint::parse(s).map_err(anyhow::Error::from))
            .collect()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe.timeout_ms)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.probe.watch_interval_secs)
    }

    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            first_success: self.probe.first_success,
        }
    }

    /// Reject settings that would stall or panic at runtime
    pub fn validate(&self) -> Result<()> {
        if self.cluster.endpoints.is_empty() {
            anyhow::bail!("cluster.endpoints must not be empty");
        }
        if self.probe.timeout_ms == 0 {
            anyhow::bail!("probe.timeout_ms must be greater than zero");
        }
        if self.probe.watch_interval_secs == 0 {
            anyhow::bail!("probe.watch_interval_secs must be greater than zero");
        }
        Ok(())
    }

    /// Configured headers plus basic auth
    fn headers(&self) -> Result<HeaderMap> {
        let headers: Vec<(String, String)> = self
            .cluster
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        transport::default_headers(
            &headers,
            self.cluster.username.as_deref(),
            self.cluster.password.as_deref(),
        )
        .context("Invalid header configuration")
    }

    /// Per-probe header supplier carrying the configured headers
    pub fn header_supplier(&self) -> Result<HeaderSupplier> {
        let headers = self.headers()?;
        Ok(Arc::new(move || headers.clone()))
    }

    /// Transport settings, including default headers and basic auth
    pub fn transport_config(&self) -> Result<TransportConfig> {
        Ok(TransportConfig {
            use_ssl: self.cluster.use_ssl,
            insecure: self.cluster.insecure,
            path_prefix: self.cluster.path_prefix.clone(),
            default_headers: self.headers()?,
            connect_timeout: Duration::from_millis(self.transport.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.transport.request_timeout_ms),
            pool_idle_timeout: Duration::from_secs(self.transport.pool_idle_timeout_secs),
        })
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: Config = serde_yaml::from_str(&content)
        .context("Failed to parse YAML configuration")?;

    config.validate()?;
    Ok(config)
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Load configuration from environment variables
///
/// - HOSTPOOL_ENDPOINTS (comma-separated `host:port` list, required)
/// - HOSTPOOL_USE_SSL, HOSTPOOL_INSECURE (optional flags)
/// - HOSTPOOL_PATH_PREFIX (optional)
/// - HOSTPOOL_USERNAME / HOSTPOOL_PASSWORD (optional basic auth)
/// - HOSTPOOL_PROBE_TIMEOUT_MS (optional, defaults to 1000)
pub fn load_from_env() -> Result<Config> {
    // Try to load .env file if it exists (don't fail if it doesn't)
    let _ = dotenvy::dotenv();

    let endpoints_str = std::env::var("HOSTPOOL_ENDPOINTS")
        .context("HOSTPOOL_ENDPOINTS environment variable not set")?;

    let endpoints: Vec<String> = endpoints_str
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if endpoints.is_empty() {
        anyhow::bail!("HOSTPOOL_ENDPOINTS contains no valid endpoints");
    }

    let mut config = Config::with_endpoints(endpoints);

    if let Some(use_ssl) = env_flag("HOSTPOOL_USE_SSL") {
        config.cluster.use_ssl = use_ssl;
    }
    if let Some(insecure) = env_flag("HOSTPOOL_INSECURE") {
        config.cluster.insecure = insecure;
    }

    config.cluster.path_prefix = std::env::var("HOSTPOOL_PATH_PREFIX").ok();
    config.cluster.username = std::env::var("HOSTPOOL_USERNAME").ok();
    config.cluster.password = std::env::var("HOSTPOOL_PASSWORD").ok();

    if let Ok(timeout) = std::env::var("HOSTPOOL_PROBE_TIMEOUT_MS") {
        config.probe.timeout_ms = timeout
            .parse()
            .context(format!("Invalid HOSTPOOL_PROBE_TIMEOUT_MS: {}", timeout))?;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a YAML file if given, otherwise from the environment
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    match config_path {
        Some(path) => load_from_yaml(path),
        None => load_from_env(),
    }
}
