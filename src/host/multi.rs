use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::endpoint::Endpoint;
use super::health::{ClusterInfo, NodeHealth, NodeState};
use super::prober::Prober;
use super::provider::{record, HostProvider, ProviderOptions, Verification};
use super::registry::HostRegistry;
use crate::error::{HostError, Result};
use crate::pool::{ClientCache, ClientFactory};

/// Order in which recorded states are re-probed during an active lookup.
///
/// Nodes last seen ONLINE are the most likely to still be up, OFFLINE ones
/// the least.
const PASS_ORDER: [NodeState; 3] = [NodeState::Online, NodeState::Unknown, NodeState::Offline];

/// Provider choosing among several cluster endpoints
///
/// Probes within one pass run concurrently as spawned tasks. Each task writes
/// its own result to the registry, so a probe that outlives the lookup still
/// records its outcome once it completes.
pub struct MultiNodeHostProvider<F: ClientFactory> {
    registry: Arc<HostRegistry>,
    prober: Arc<Prober>,
    clients: ClientCache<F>,
    options: ProviderOptions,
}

impl<F: ClientFactory> MultiNodeHostProvider<F> {
    pub fn new(
        endpoints: impl IntoIterator<Item = Endpoint>,
        prober: Prober,
        factory: F,
        options: ProviderOptions,
    ) -> Self {
        Self {
            registry: Arc::new(HostRegistry::seed(endpoints)),
            prober: Arc::new(prober),
            clients: ClientCache::new(factory),
            options,
        }
    }

    pub fn options(&self) -> ProviderOptions {
        self.options
    }

    /// Recorded node states in a fresh random order
    fn shuffled_hosts(&self) -> Vec<NodeHealth> {
        let mut hosts = self.registry.snapshot().into_nodes();
        hosts.shuffle(&mut rand::thread_rng());
        hosts
    }

    /// Probe `endpoints` concurrently; results arrive in completion order
    /// after they have been recorded.
    fn spawn_probes(&self, endpoints: Vec<Endpoint>) -> mpsc::UnboundedReceiver<NodeHealth> {
        let (tx, rx) = mpsc::unbounded_channel();

        for endpoint in endpoints {
            let tx = tx.clone();
            let prober = Arc::clone(&self.prober);
            let registry = Arc::clone(&self.registry);

            tokio::spawn(async move {
                let health = prober.probe(&endpoint).await;
                if let Err(e) = record(&registry, health.clone()) {
                    warn!(endpoint = %endpoint, error = %e, "Failed to record probe result");
                }
                // The lookup may already have returned
                let _ = tx.send(health);
            });
        }

        rx
    }

    /// One probing pass over the nodes currently recorded as `state`
    async fn find_active_in(&self, state: NodeState) -> Option<Endpoint> {
        let candidates = self.registry.endpoints_in(state);
        if candidates.is_empty() {
            return None;
        }

        debug!(state = %state, count = candidates.len(), "Probing nodes");
        let mut results = self.spawn_probes(candidates);
        let mut found = None;

        while let Some(health) = results.recv().await {
            if health.is_online() {
                if self.options.first_success {
                    return Some(health.into_endpoint());
                }
                found = Some(health.into_endpoint());
            }
        }

        found
    }
}

#[async_trait]
impl<F: ClientFactory> HostProvider for MultiNodeHostProvider<F> {
    type Client = F::Client;

    async fn cluster_info(&self) -> ClusterInfo {
        let mut results = self.spawn_probes(self.registry.endpoints());
        while results.recv().await.is_some() {}
        self.registry.snapshot()
    }

    async fn lookup_active_host(&self, verification: Verification) -> Result<Endpoint> {
        if verification == Verification::Lazy {
            if let Some(host) = self.shuffled_hosts().into_iter().find(NodeHealth::is_online) {
                return Ok(host.into_endpoint());
            }
            debug!("No node recorded online, falling back to active lookup");
        }

        for state in PASS_ORDER {
            if let Some(endpoint) = self.find_active_in(state).await {
                debug!(endpoint = %endpoint, pass = %state, "Selected active node");
                return Ok(endpoint);
            }
        }

        let info = self.registry.snapshot();
        warn!(cluster = %info, "No reachable host");
        Err(HostError::NoReachableHost(info))
    }

    fn create_client_for(&self, endpoint: &Endpoint) -> Result<Self::Client> {
        if !self.registry.contains(endpoint) {
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
