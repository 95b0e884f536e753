//! Command line configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Generate service topology and inspect the registry it lands in.
#[derive(Debug, Parser)]
#[command(name = "topology", version)]
pub struct CliConfig {
    /// Registry snapshot file (created on first write).
    #[arg(long, global = true, default_value = "registry.json")]
    pub registry: PathBuf,

    /// Log filter, e.g. `debug` or `generator=debug`. `RUST_LOG` wins if set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate, expand and publish a topology declaration.
    Generate {
        /// Declaration file (JSON).
        #[arg(long)]
        config: PathBuf,
        /// Override the declaration's default colo.
        #[arg(long)]
        default_colo: Option<String>,
        /// Validate and expand only; do not write the registry.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the partition a key or URI routes to.
    Route {
        #[arg(long)]
        cluster: String,
        #[command(flatten)]
        target: RouteTarget,
    },
    /// Print a stored record as JSON.
    Show {
        #[command(flatten)]
        target: ShowTarget,
        /// Service group namespace of `--service`.
        #[arg(long, requires = "service")]
        group: Option<String>,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct RouteTarget {
    /// Decimal partition key.
    #[arg(long)]
    pub key: Option<String>,
    /// Request URI to extract the key from.
    #[arg(long)]
    pub uri: Option<String>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct ShowTarget {
    #[arg(long)]
    pub cluster: Option<String>,
    #[arg(long)]
    pub service: Option<String>,
}
