//! Lazily built, per-endpoint client handles

use dashmap::DashMap;
use tracing::debug;

use crate::error::Result;
use crate::host::Endpoint;

/// Builds the client handle used to talk to one endpoint
pub trait ClientFactory: Send + Sync {
    type Client: Clone + Send + Sync + 'static;

    fn create_client_for(&self, endpoint: &Endpoint) -> Result<Self::Client>;
}

/// Caches one client per endpoint for the life of the cache
///
/// Clients are built on first use; later calls return clones of the cached
/// handle.
pub struct ClientCache<F: ClientFactory> {
    factory: F,
    clients: DashMap<Endpoint, F::Client>,
}

impl<F: ClientFactory> ClientCache<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            clients: DashMap::new(),
        }
    }

    /// Return the cached client for `endpoint`, building it if needed
    pub fn get_or_create(&self, endpoint: &Endpoint) -> Result<F::Client> {
        if let Some(client) = self.clients.get(endpoint) {
            return Ok(client.value().clone());
        }

        let entry = self
            .clients
            .entry(endpoint.clone())
            .or_try_insert_with(|| {
                debug!(endpoint = %endpoint, "Creating client");
                self.factory.create_client_for(endpoint)
            })?;
        Ok(entry.value().clone())
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.clients.contains_key(endpoint)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}
