//! hostpool - node liveness tracking and failover routing for HTTP clusters

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod pool;
pub mod transport;

pub use crate::config::Config;
pub use crate::core::Core;
pub use crate::error::{HostError, ProbeError};
