use async_trait::async_trait;
use tracing::{debug, warn};

use super::endpoint::Endpoint;
use super::health::{ClusterInfo, NodeState};
use super::prober::Prober;
use super::provider::{record, HostProvider, Verification};
use super::registry::HostRegistry;
use crate::error::{HostError, Result};
use crate::pool::{ClientCache, ClientFactory};

/// Provider for a cluster reached through exactly one endpoint
pub struct SingleNodeHostProvider<F: ClientFactory> {
    endpoint: Endpoint,
    registry: HostRegistry,
    prober: Prober,
    clients: ClientCache<F>,
}

impl<F: ClientFactory> SingleNodeHostProvider<F> {
    pub fn new(endpoint: Endpoint, prober: Prober, factory: F) -> Self {
        Self {
            registry: HostRegistry::seed([endpoint.clone()]),
            endpoint,
            prober,
            clients: ClientCache::new(factory),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn refresh(&self) -> Result<NodeState> {
        let health = self.prober.probe(&self.endpoint).await;
        record(&self.registry, health)
    }
}

#[async_trait]
impl<F: ClientFactory> HostProvider for SingleNodeHostProvider<F> {
    type Client = F::Client;

    async fn cluster_info(&self) -> ClusterInfo {
        if let Err(e) = self.refresh().await {
            warn!(endpoint = %self.endpoint, error = %e, "Failed to record probe result");
        }
        self.registry.snapshot()
    }

    async fn lookup_active_host(&self, verification: Verification) -> Result<Endpoint> {
        if verification == Verification::Lazy && self.registry.get(&self.endpoint)?.is_online() {
            return Ok(self.endpoint.clone());
        }

        debug!(endpoint = %self.endpoint, ?verification, "Verifying single node");
        match self.refresh().await? {
            NodeState::Online => Ok(self.endpoint.clone()),
            _ => {
                let info = self.registry.snapshot();
                warn!(cluster = %info, "No reachable host");
                Err(HostError::NoReachableHost(info))
            }
        }
    }

    fn create_client_for(&self, endpoint: &Endpoint) -> Result<Self::Client> {
        if endpoint != &self.endpoint {
            return Err(HostError::UnknownEndpoint(endpoint.clone()));
        }
        self.clients.get_or_create(endpoint)
    }

    fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    fn prober(&self) -> &Prober {
        &self.prober
    }
}
