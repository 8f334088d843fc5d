use dashmap::DashMap;

use super::endpoint::Endpoint;
use super::health::{ClusterInfo, NodeHealth, NodeState};
use crate::error::{HostError, Result};

/// Concurrent map from endpoint to its latest health observation.
///
/// The key set is fixed when the registry is seeded. Updates replace one
/// entry atomically; concurrent updates to the same endpoint are last-writer-wins,
/// so a late-completing probe can overwrite a newer result.
#[derive(Debug)]
pub struct HostRegistry {
    hosts: DashMap<Endpoint, NodeHealth>,
}

impl HostRegistry {
    /// Create a registry tracking `endpoints`, each starting as UNKNOWN
    pub fn seed(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        let hosts = DashMap::new();
        for endpoint in endpoints {
            hosts.insert(endpoint.clone(), NodeHealth::unknown(endpoint));
        }
        Self { hosts }
    }

    /// Replace the entry for `health.endpoint()`, returning the previous state
    pub fn update(&self, health: NodeHealth) -> Result<NodeState> {
        let Some(mut entry) = self.hosts.get_mut(health.endpoint()) else {
            return Err(HostError::UnknownEndpoint(health.endpoint().clone()));
        };
        let previous = entry.state();
        *entry = health;
        Ok(previous)
    }

    pub fn get(&self, endpoint: &Endpoint) -> Result<NodeHealth> {
        self.hosts
            .get(endpoint)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| HostError::UnknownEndpoint(endpoint.clone()))
    }

    pub fn snapshot(&self) -> ClusterInfo {
        ClusterInfo::new(self.hosts.iter().map(|entry| entry.value().clone()))
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.hosts.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Endpoints whose recorded state is currently `state`
    pub fn endpoints_in(&self, state: NodeState) -> Vec<Endpoint> {
        self.hosts
            .iter()
            .filter(|entry| entry.value().state() == state)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.hosts.contains_key(endpoint)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
