use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hyper::header::HeaderMap;
use hyper::StatusCode;
use tracing::{debug, warn};

use super::endpoint::Endpoint;
use super::health::NodeHealth;
use crate::error::ProbeError;

/// Per-probe timeout used unless overridden
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Sends the liveness request for a probe
///
/// Implementations only need to issue `HEAD /` against the endpoint and report
/// the status or the failure. Status classification and timeouts are handled by
/// [`Prober`].
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn head(&self, endpoint: &Endpoint, headers: &HeaderMap) -> Result<StatusCode, ProbeError>;
}

/// Produces the headers attached to each probe (called once per probe)
pub type HeaderSupplier = Arc<dyn Fn() -> HeaderMap + Send + Sync>;

/// Receives every probe failure
pub type ErrorListener = Arc<dyn Fn(&Endpoint, &ProbeError) + Send + Sync>;

/// Error listener that logs failures through `tracing`
pub fn logging_listener() -> ErrorListener {
    Arc::new(|endpoint, error| {
        warn!(endpoint = %endpoint, error = %error, "Node probe failed");
    })
}

/// Issues liveness probes and turns their outcome into [`NodeHealth`]
///
/// Network failures never escape: they become an OFFLINE observation and are
/// forwarded to the error listener.
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn ProbeTransport>,
    headers: HeaderSupplier,
    listener: ErrorListener,
    timeout: Duration,
}

impl Prober {
    /// Create a prober with no extra headers and a logging error listener
    pub fn new(transport: Arc<dyn ProbeTransport>) -> Self {
        Self {
            transport,
            headers: Arc::new(HeaderMap::new),
            listener: logging_listener(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header_supplier(mut self, headers: HeaderSupplier) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_error_listener(mut self, listener: ErrorListener) -> Self {
        self.listener = listener;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `endpoint` with freshly supplied headers
    pub async fn probe(&self, endpoint: &Endpoint) -> NodeHealth {
        let headers = (self.headers)();
        self.probe_with_headers(endpoint, &headers).await
    }

    pub async fn probe_with_headers(&self, endpoint: &Endpoint, headers: &HeaderMap) -> NodeHealth {
        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.transport.head(endpoint, headers)).await {
            Ok(Ok(status)) if status.is_client_error() || status.is_server_error() => {
                Err(ProbeError::Status(status))
            }
            Ok(Ok(status)) => Ok(status),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };
        let latency = start.elapsed();

        match outcome {
            Ok(status) => {
                debug!(
                    endpoint = %endpoint,
                    status = status.as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "Probe OK"
                );
                NodeHealth::online(endpoint.clone())
            }
            Err(e) => {
                debug!(
                    endpoint = %endpoint,
                    error = %e,
                    latency_ms = latency.as_millis() as u64,
                    "Probe failed"
                );
                self.report(endpoint, &e);
                NodeHealth::offline(endpoint.clone())
            }
        }
    }

    /// Forward a failure to the error listener
    pub fn report(&self, endpoint: &Endpoint, error: &ProbeError) {
        (self.listener)(endpoint, error);
    }
}

impl std::fmt::Debug for Prober {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prober")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
