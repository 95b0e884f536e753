//! CLI tool for service topology.
//!
//! Provides commands for:
//! - Generating registry records from a topology declaration
//! - Routing a key or request URI to its partition
//! - Showing stored cluster and service records

pub mod commands;
pub mod config;

pub use commands::{run, CommandResult};
pub use config::{CliConfig, Command};

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// `default_filter`.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}
