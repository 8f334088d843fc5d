//! Command implementations for the hostpool binary

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

use crate::core::Core;
use crate::error::HostError;
use crate::host::{ClusterInfo, NodeState, Verification};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct LookupResult<'a> {
    endpoint: Option<String>,
    verification: &'a str,
    cluster: ClusterInfo,
}

/// Render cluster state as an aligned table
pub fn format_cluster(info: &ClusterInfo) -> String {
    let width = info
        .iter()
        .map(|n| n.endpoint().to_string().len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut out = format!("{:<width$}  {:<8}  {}\n", "ENDPOINT", "STATE", "OBSERVED", width = width);
    for node in info {
        out.push_str(&format!(
            "{:<width$}  {:<8}  {}\n",
            node.endpoint().to_string(),
            node.state().to_string(),
            node.observed_at().format("%Y-%m-%d %H:%M:%S UTC"),
            width = width
        ));
    }
    out.push_str(&format!(
        "{} of {} nodes online\n",
        info.count(NodeState::Online),
        info.len()
    ));
    out
}

/// Probe every node and print the cluster state
pub async fn cmd_status(core: &Core, format: OutputFormat) -> Result<bool> {
    let start = Instant::now();
    let info = core.provider().cluster_info().await;
    info!(latency_ms = start.elapsed().as_millis() as u64, "Cluster status collected");

    match format {
        OutputFormat::Text => print!("{}", format_cluster(&info)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
    }

    Ok(info.is_healthy())
}

/// Look up the node the next request would go to
pub async fn cmd_lookup(core: &Core, lazy: bool, format: OutputFormat) -> Result<bool> {
    let verification = if lazy {
        Verification::Lazy
    } else {
        Verification::Active
    };
    let label = if lazy { "lazy" } else { "active" };

    let (endpoint, cluster) = match core.provider().lookup_active_host(verification).await {
        Ok(endpoint) => (Some(endpoint), core.provider().snapshot()),
        Err(HostError::NoReachableHost(info)) => (None, info),
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Text => match &endpoint {
            Some(endpoint) => println!("{}", endpoint),
            None => {
                eprintln!("No reachable host");
                eprint!("{}", format_cluster(&cluster));
            }
        },
        OutputFormat::Json => {
            let result = LookupResult {
                endpoint: endpoint.as_ref().map(ToString::to_string),
                verification: label,
                cluster,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(endpoint.is_some())
}

/// Refresh node health periodically and print each change
pub async fn cmd_watch(core: &Core, format: OutputFormat) -> Result<()> {
    let handle = core.start_watcher();
    let mut ticker = tokio::time::interval(core.config.watch_interval());
    let mut last: Option<Vec<NodeState>> = None;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                handle.abort();
                info!("Watch stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                let info = core.provider().snapshot();
                let states: Vec<NodeState> = info.iter().map(|n| n.state()).collect();
                if last.as_ref() == Some(&states) {
                    continue;
                }
                last = Some(states);

                match format {
                    OutputFormat::Text => {
                        println!("--- {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
                        print!("{}", format_cluster(&info));
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string(&info)?),
                }
            }
        }
    }
}
