//! Error types for host tracking and selection

use std::time::Duration;

use hyper::StatusCode;
use thiserror::Error;

use crate::host::{ClusterInfo, Endpoint};

/// Errors surfaced by the host registry and providers
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Malformed endpoint '{input}': {reason}")]
    MalformedEndpoint { input: String, reason: String },

    #[error("Endpoint {0} is not tracked by this provider")]
    UnknownEndpoint(Endpoint),

    #[error("No reachable host found: [{0}]")]
    NoReachableHost(ClusterInfo),

    #[error("No endpoints configured")]
    NoEndpointsConfigured,

    #[error("Failed to create client for {endpoint}: {reason}")]
    ClientBuild { endpoint: Endpoint, reason: String },
}

impl HostError {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        HostError::MalformedEndpoint {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// The cluster state attached to a `NoReachableHost` failure
    pub fn cluster_info(&self) -> Option<&ClusterInfo> {
        match self {
            HostError::NoReachableHost(info) => Some(info),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;

/// Failure of a single liveness probe.
///
/// Never returned to callers of a lookup; it is turned into an OFFLINE
/// observation and handed to the error listener.
#[derive(Error, Debug, Clone)]
pub enum ProbeError {
    #[error("Probe timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Node answered with error status {0}")]
    Status(StatusCode),

    #[error("Request failed: {0}")]
    Request(String),
}
