use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::health::NodeState;
use super::provider::HostProvider;

/// Shortest refresh period; smaller intervals are raised to this
pub const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(10);

/// Periodically refreshes the health of every node in the background
pub struct HostWatcher;

impl HostWatcher {
    /// Start refreshing every `interval`; runs until the handle is aborted
    pub fn start<P>(provider: Arc<P>, interval: Duration) -> JoinHandle<()>
    where
        P: HostProvider + ?Sized + 'static,
    {
        let interval = interval.max(MIN_WATCH_INTERVAL);
        tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "Host watcher started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let start = Instant::now();
                let info = provider.cluster_info().await;
                let online = info.count(NodeState::Online);

                debug!(
                    online,
                    total = info.len(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Health refresh completed"
                );
                if online == 0 {
                    warn!(cluster = %info, "No node is reachable");
                }
            }
        })
    }
}
