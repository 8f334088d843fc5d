use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::host::{logging_listener, provider_for, HostProvider, HostWatcher, Prober};
use crate::transport::{HttpClient, HttpTransport};

/// Provider type built by [`Core`]
pub type SharedProvider = Arc<dyn HostProvider<Client = HttpClient>>;

/// Wires configuration, transport, prober and provider together
///
/// Clone is cheap; clones share the provider and its registry.
#[derive(Clone)]
pub struct Core {
    pub config: Arc<Config>,
    transport: HttpTransport,
    provider: SharedProvider,
}

impl Core {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let endpoints = config.endpoints()?;

        let transport = HttpTransport::new(config.transport_config()?)
            .context("Failed to build HTTP transport")?;

        let prober = Prober::new(Arc::new(transport.clone()))
            .with_timeout(config.probe_timeout())
            .with_header_supplier(config.header_supplier()?)
            .with_error_listener(logging_listener());

        let provider = provider_for(
            endpoints,
            prober,
            transport.clone(),
            config.provider_options(),
        )?;

        tracing::debug!(
            endpoints = provider.registry().len(),
            probe_timeout_ms = config.probe.timeout_ms,
            "Host provider ready"
        );

        Ok(Self {
            config: Arc::new(config),
            transport,
            provider,
        })
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Start the background health refresher (for long-running processes)
    pub fn start_watcher(&self) -> JoinHandle<()> {
        HostWatcher::start(Arc::clone(&self.provider), self.config.watch_interval())
    }
}
