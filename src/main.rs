use anyhow::Result;
use clap::{Parser, Subcommand};

use hostpool::cli::{self, OutputFormat};
use hostpool::config;
use hostpool::Core;

#[derive(Parser)]
#[command(name = "hostpool")]
#[command(version, about = "Cluster node health tracking and failover lookup", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (falls back to HOSTPOOL_* environment variables)
    #[arg(long, global = true, env = "HOSTPOOL_CONFIG")]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every node and show the cluster state
    Status,

    /// Show the node the next request would be sent to
    Lookup {
        /// Trust nodes already known to be online instead of probing
        #[arg(long)]
        lazy: bool,
    },

    /// Refresh node health periodically and print changes
    Watch {
        /// Refresh interval in seconds (overrides the config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    cli::init_logging(&cli.log_level)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let healthy = runtime.block_on(async_main(cli))?;
    if !healthy {
        std::process::exit(1);
    }
    Ok(())
}

async fn async_main(cli: Cli) -> Result<bool> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Commands::Watch { interval: Some(secs) } = cli.command {
        config.probe.watch_interval_secs = secs;
    }

    let core = Core::new(config)?;

    match cli.command {
        Commands::Status => cli::cmd_status(&core, cli.format).await,
        Commands::Lookup { lazy } => cli::cmd_lookup(&core, lazy, cli.format).await,
        Commands::Watch { .. } => {
            cli::cmd_watch(&core, cli.format).await?;
            Ok(true)
        }
    }
}
