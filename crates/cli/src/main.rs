//! CLI entry point for the `topology` tool.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use cli::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = CliConfig::parse();
    cli::init_tracing(&config.log_level).context("error initializing logging/tracing system")?;

    let result = cli::run(&config).await.map_err(|err| {
        tracing::error!(error = ?err, "command failed");
        err
    })?;
    print!("{}", result.output);
    Ok(ExitCode::from(result.exit_code))
}
