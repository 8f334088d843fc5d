use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::endpoint::Endpoint;
use super::health::{ClusterInfo, NodeHealth, NodeState};
use super::multi::MultiNodeHostProvider;
use super::prober::Prober;
use super::registry::HostRegistry;
use super::single::SingleNodeHostProvider;
use crate::error::{HostError, ProbeError, Result};
use crate::pool::ClientFactory;

/// How much checking `lookup_active_host` does before answering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verification {
    /// Trust a node already recorded ONLINE; probe only if there is none
    Lazy,
    /// Always probe before answering
    #[default]
    Active,
}

/// Tuning for provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderOptions {
    /// Return the first node found ONLINE in a probing pass instead of
    /// waiting for the whole pass and returning the last one
    pub first_success: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self { first_success: true }
    }
}

/// Picks the node the next request should go to
#[async_trait]
pub trait HostProvider: Send + Sync {
    /// Handle type produced by the client factory
    type Client: Clone + Send + Sync + 'static;

    /// Probe every tracked node and return the fresh cluster state
    async fn cluster_info(&self) -> ClusterInfo;

    /// Find a node to send a request to, or fail with `NoReachableHost`
    async fn lookup_active_host(&self, verification: Verification) -> Result<Endpoint>;

    /// Cached client for a tracked endpoint
    fn create_client_for(&self, endpoint: &Endpoint) -> Result<Self::Client>;

    fn registry(&self) -> &HostRegistry;

    fn prober(&self) -> &Prober;

    /// Current recorded state, without probing
    fn snapshot(&self) -> ClusterInfo {
        self.registry().snapshot()
    }

    /// Look up an active node and return it with its client
    async fn active_client(&self, verification: Verification) -> Result<(Endpoint, Self::Client)> {
        let endpoint = self.lookup_active_host(verification).await?;
        let client = self.create_client_for(&endpoint)?;
        Ok((endpoint, client))
    }

    /// Record a transport failure seen by a real request.
    ///
    /// Marks the node OFFLINE so the next lookup reflects it, and forwards
    /// the error to the error listener.
    fn report_failure(&self, endpoint: &Endpoint, error: &ProbeError) -> Result<()> {
        record(self.registry(), NodeHealth::offline(endpoint.clone()))?;
        self.prober().report(endpoint, error);
        Ok(())
    }

    /// Record a successful real request against `endpoint`
    fn report_success(&self, endpoint: &Endpoint) -> Result<()> {
        record(self.registry(), NodeHealth::online(endpoint.clone()))?;
        Ok(())
    }
}

/// Store an observation, logging state transitions
pub(crate) fn record(registry: &HostRegistry, health: NodeHealth) -> Result<NodeState> {
    let state = health.state();
    let endpoint = health.endpoint().clone();
    let previous = registry.update(health)?;
    if previous != state {
        info!(endpoint = %endpoint, from = %previous, to = %state, "Node state changed");
    }
    Ok(state)
}

/// Build the provider matching the number of distinct endpoints.
///
/// One endpoint gets a [`SingleNodeHostProvider`], more get a
/// [`MultiNodeHostProvider`].
pub fn provider_for<F>(
    endpoints: impl IntoIterator<Item = Endpoint>,
    prober: Prober,
    factory: F,
    options: ProviderOptions,
) -> Result<Arc<dyn HostProvider<Client = F::Client>>>
where
    F: ClientFactory + 'static,
{
    let mut endpoints: Vec<Endpoint> = endpoints
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    match endpoints.len() {
        0 => Err(HostError::NoEndpointsConfigured),
        1 => {
            let endpoint = endpoints.remove(0);
            Ok(Arc::new(SingleNodeHostProvider::new(endpoint, prober, factory)))
        }
        _ => Ok(Arc::new(MultiNodeHostProvider::new(
            endpoints, prober, factory, options,
        ))),
    }
}
