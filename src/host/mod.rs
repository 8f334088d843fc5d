//! Host liveness tracking and failover selection
//!
//! This module decides which cluster node an outgoing request should target.
//!
//! # Components
//!
//! - [`Endpoint`]: an immutable `host:port` identifier
//! - [`NodeHealth`]: one observation of a node's state (ONLINE, OFFLINE, UNKNOWN)
//! - [`HostRegistry`]: concurrent map from endpoint to its latest observation
//! - [`Prober`]: issues `HEAD /` liveness checks through a [`ProbeTransport`]
//! - [`HostProvider`]: node selection, implemented by [`SingleNodeHostProvider`]
//!   and [`MultiNodeHostProvider`]
//! - [`ClusterInfo`]: point-in-time copy of every node's health
//! - [`HostWatcher`]: optional background refresher
//!
//! # Selection
//!
//! `lookup_active_host(Lazy)` returns a random node already recorded ONLINE,
//! without probing. Otherwise (or when none is ONLINE) the multi-node provider
//! probes in three passes: nodes recorded ONLINE, then UNKNOWN, then OFFLINE.
//! Probes within a pass run concurrently and every result is recorded. If no
//! pass finds a node, the lookup fails with `NoReachableHost` carrying the
//! cluster state.
//!
//! With the default [`ProviderOptions`] a pass returns as soon as one node
//! answers ONLINE. Slower probes from that pass keep running and record their
//! results after the lookup has returned, so a snapshot taken immediately
//! afterwards may still show those nodes in their previous state. Set
//! `first_success: false` to wait for the whole pass.
//!
//! Each node moves `UNKNOWN -> ONLINE | OFFLINE` on its first probe and then
//! between ONLINE and OFFLINE; it never returns to UNKNOWN.
//!
//! # Example
//!
//! ```rust,no_run
//! use hostpool::host::{provider_for, Endpoint, HostProvider, Prober, ProviderOptions, Verification};
//! use hostpool::transport::{HttpTransport, TransportConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(TransportConfig::default())?;
//! let prober = Prober::new(Arc::new(transport.clone()));
//! let endpoints = vec![Endpoint::parse("es-1:9200")?, Endpoint::parse("es-2:9200")?];
//!
//! let provider = provider_for(endpoints, prober, transport, ProviderOptions::default())?;
//! let (endpoint, client) = provider.active_client(Verification::Lazy).await?;
//! let (status, _body) = client.get("/_cluster/health").await?;
//! println!("{} answered {}", endpoint, status);
//! # Ok(())
//! # }
//! ```

pub mod endpoint;
pub mod health;
pub mod multi;
pub mod prober;
pub mod provider;
pub mod registry;
pub mod single;
pub mod watch;

pub use endpoint::{Endpoint, DEFAULT_PORT};
pub use health::{ClusterInfo, NodeHealth, NodeState};
pub use multi::MultiNodeHostProvider;
pub use prober::{
    logging_listener, ErrorListener, HeaderSupplier, ProbeTransport, Prober, DEFAULT_PROBE_TIMEOUT,
};
pub use provider::{provider_for, HostProvider, ProviderOptions, Verification};
pub use registry::HostRegistry;
pub use single::SingleNodeHostProvider;
pub use watch::{HostWatcher, MIN_WATCH_INTERVAL};
