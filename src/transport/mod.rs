//! HTTP transport for probes and cluster requests
//!
//! - HTTP/1.1 over one shared, pooled hyper client
//! - native-tls (OpenSSL) for TLS, with an opt-in insecure mode
//! - TCP_NODELAY, bounded connect timeout, idle pool timeout
//! - Default headers (and basic auth) applied to every request

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use hyper::{Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use thiserror::Error;
use url::Url;

use crate::error::{HostError, ProbeError};
use crate::host::{Endpoint, ProbeTransport};
use crate::pool::ClientFactory;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Body error: {0}")]
    Body(String),
}

impl From<TransportError> for ProbeError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(d) => ProbeError::Timeout(d),
            TransportError::Connect(msg) => ProbeError::Connect(msg),
            other => ProbeError::Request(other.to_string()),
        }
    }
}

/// Build an `Authorization: Basic` header value
pub fn basic_auth(username: &str, password: &str) -> Option<HeaderValue> {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    let mut value = HeaderValue::from_str(&format!("Basic {}", token)).ok()?;
    value.set_sensitive(true);
    Some(value)
}

/// Transport settings
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Use `https` instead of `http`
    pub use_ssl: bool,
    /// Disable certificate and hostname verification
    pub insecure: bool,
    /// Path prepended to every request (e.g. behind a reverse proxy)
    pub path_prefix: Option<String>,
    /// Headers sent with every request
    pub default_headers: HeaderMap,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            use_ssl: false,
            insecure: false,
            path_prefix: None,
            default_headers: HeaderMap::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

type PooledClient = HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Shared HTTP transport
///
/// Clone is cheap: the underlying hyper client pools connections per host
/// and is shared by every clone and every [`HttpClient`] it creates.
#[derive(Clone)]
pub struct HttpTransport {
    client: PooledClient,
    config: Arc<TransportConfig>,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(config.connect_timeout));
        http.set_keepalive(Some(Duration::from_secs(90)));

        let tls = if config.insecure {
            tracing::warn!("INSECURE TLS MODE ENABLED: Certificate verification is disabled!");
            TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()?
        } else {
            TlsConnector::new()?
        };

        let https = HttpsConnector::from((http, tls.into()));

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .set_host(true)
            .build(https);

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Base URL for `endpoint`, including the path prefix; always ends in `/`
    pub fn base_url(&self, endpoint: &Endpoint) -> Result<Url, TransportError> {
        let scheme = if self.config.use_ssl { "https" } else { "http" };
        let mut url = Url::parse(&format!("{}://{}/", scheme, endpoint))?;
        if let Some(prefix) = self.config.path_prefix.as_deref() {
            let prefix = prefix.trim_matches('/');
            if !prefix.is_empty() {
                url = url.join(&format!("{}/", prefix))?;
            }
        }
        Ok(url)
    }

    /// Client bound to one endpoint, sharing this transport's connection pool
    pub fn client_for(&self, endpoint: &Endpoint) -> Result<HttpClient, TransportError> {
        Ok(HttpClient {
            client: self.client.clone(),
            endpoint: endpoint.clone(),
            base_url: self.base_url(endpoint)?,
            config: Arc::clone(&self.config),
        })
    }
}

#[async_trait]
impl ProbeTransport for HttpTransport {
    async fn head(&self, endpoint: &Endpoint, headers: &HeaderMap) -> Result<StatusCode, ProbeError> {
        let client = self.client_for(endpoint)?;
        Ok(client.head("/", headers).await?)
    }
}

impl ClientFactory for HttpTransport {
    type Client = HttpClient;

    fn create_client_for(&self, endpoint: &Endpoint) -> crate::error::Result<HttpClient> {
        self.client_for(endpoint).map_err(|e| HostError::ClientBuild {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })
    }
}

/// Client handle for one endpoint
#[derive(Clone)]
pub struct HttpClient {
    client: PooledClient,
    endpoint: Endpoint,
    base_url: Url,
    config: Arc<TransportConfig>,
}

impl HttpClient {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL (leading `/` is relative to the prefix)
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Send one request and collect the response body
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<(StatusCode, Bytes), TransportError> {
        let url = self.url_for(path)?;

        let mut merged = self.config.default_headers.clone();
        for (name, value) in headers.iter() {
            merged.insert(name.clone(), value.clone());
        }

        let mut request = Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(Full::new(body))?;
        *request.headers_mut() = merged;

        let response = match tokio::time::timeout(self.config.request_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_connect() => return Err(TransportError::Connect(e.to_string())),
            Ok(Err(e)) => return Err(TransportError::Request(e.to_string())),
            Err(_) => return Err(TransportError::Timeout(self.config.request_timeout)),
        };

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
            .to_bytes();

        Ok((status, body))
    }

    pub async fn head(&self, path: &str, headers: &HeaderMap) -> Result<StatusCode, TransportError> {
        let (status, _) = self.request(Method::HEAD, path, headers, Bytes::new()).await?;
        Ok(status)
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Bytes), TransportError> {
        self.request(Method::GET, path, &HeaderMap::new(), Bytes::new()).await
    }
}

/// Merge configured default headers with basic auth credentials
pub fn default_headers(
    headers: &[(String, String)],
    username: Option<&str>,
    password: Option<&str>,
) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = hyper::header::HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::Http(e.into()))?;
        let value = HeaderValue::from_str(value).map_err(|e| TransportError::Http(e.into()))?;
        map.insert(name, value);
    }
    if let Some(user) = username {
        if let Some(value) = basic_auth(user, password.unwrap_or_default()) {
            map.insert(AUTHORIZATION, value);
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(config: TransportConfig) -> HttpTransport {
        HttpTransport::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_base_url() {
        let t = transport(TransportConfig::default());
        let url = t.base_url(&Endpoint::new("es-1", 9200)).unwrap();
        assert_eq!(url.as_str(), "http://es-1:9200/");

        let t = transport(TransportConfig {
            use_ssl: true,
            path_prefix: Some("/search/".to_string()),
            ..Default::default()
        });
        let url = t.base_url(&Endpoint::new("es-1", 9243)).unwrap();
        assert_eq!(url.as_str(), "https://es-1:9243/search/");
    }

    #[tokio::test]
    async fn test_url_for_keeps_prefix() {
        let t = transport(TransportConfig {
            path_prefix: Some("es".to_string()),
            ..Default::default()
        });
        let client = t.client_for(&Endpoint::new("localhost", 9200)).unwrap();
        assert_eq!(client.url_for("/").unwrap().as_str(), "http://localhost:9200/es/");
        assert_eq!(
            client.url_for("/_cluster/health").unwrap().as_str(),
            "http://localhost:9200/es/_cluster/health"
        );
    }

    #[tokio::test]
    async fn test_ipv6_base_url() {
        let t = transport(TransportConfig::default());
        let url = t.base_url(&Endpoint::new("::1", 9200)).unwrap();
        assert_eq!(url.as_str(), "http://[::1]:9200/");
    }

    #[test]
    fn test_basic_auth() {
        let value = basic_auth("elastic", "changeme").unwrap();
        assert_eq!(value, "Basic ZWxhc3RpYzpjaGFuZ2VtZQ==");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers(
            &[("X-Opaque-Id".to_string(), "hostpool".to_string())],
            Some("elastic"),
            None,
        )
        .unwrap();
        assert_eq!(headers.get("x-opaque-id").unwrap(), "hostpool");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Basic ZWxhc3RpYzo=");

        assert!(default_headers(&[("bad header".to_string(), "v".to_string())], None, None).is_err());
    }

    #[test]
    fn test_transport_error_to_probe_error() {
        let err: ProbeError = TransportError::Timeout(Duration::from_secs(1)).into();
        assert!(matches!(err, ProbeError::Timeout(_)));

        let err: ProbeError = TransportError::Connect("refused".to_string()).into();
        assert!(matches!(err, ProbeError::Connect(_)));
    }
}
